use crate::scrapers::patterns::PATTERNS;
use crate::types::{Video, VideoType};

/// Normalize a title for comparison: lowercase, alphanumerics only,
/// collapsed whitespace
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Check whether a scraped release title matches the requested video.
///
/// Movies: the text before the year token must equal the wanted title once
/// normalized, and the year (when both sides carry one) must agree within
/// one year, since sites disagree on regional release years.
/// Episodes: the release must carry a matching SxxEyy (or NxM) tag, and the
/// text before the tag must equal the wanted title.
pub fn title_match(candidate: &str, video: &Video) -> bool {
    let wanted = normalize_title(&video.title);
    if wanted.is_empty() {
        return false;
    }

    let cleaned = clean_release_title(candidate);

    match video.video_type {
        VideoType::Episode | VideoType::Season => episode_match(&cleaned, &wanted, video),
        _ => movie_match(&cleaned, &wanted, video),
    }
}

fn movie_match(cleaned: &str, wanted: &str, video: &Video) -> bool {
    let patterns = &*PATTERNS;

    let (title_part, found_year) = match patterns.year.find(cleaned) {
        Some(m) => (
            &cleaned[..m.start()],
            m.as_str().parse::<i32>().ok(),
        ),
        None => (cleaned, None),
    };

    if let Some(wanted_year) = video.year
        && let Some(got_year) = found_year
        && (got_year - wanted_year).abs() > 1
    {
        return false;
    }

    normalize_title(&strip_release_tokens(title_part)) == wanted
}

fn episode_match(cleaned: &str, wanted: &str, video: &Video) -> bool {
    let patterns = &*PATTERNS;

    if video.video_type == VideoType::Season {
        // A release with an SxxEyy tag is a single episode, not a pack
        if patterns.season_episode.is_match(cleaned) {
            return false;
        }
        let Some(caps) = patterns.season_pack.captures(cleaned) else {
            return false;
        };
        let season: Option<i32> = caps.get(1).and_then(|m| m.as_str().parse().ok());
        if season != video.season {
            return false;
        }
        let tag_start = caps.get(0).map_or(0, |m| m.start());
        return normalize_title(&strip_release_tokens(&cleaned[..tag_start])) == wanted;
    }

    let tag = patterns
        .season_episode
        .captures(cleaned)
        .or_else(|| patterns.season_x_episode.captures(cleaned));

    let Some(caps) = tag else {
        return false;
    };

    let season: Option<i32> = caps.get(1).and_then(|m| m.as_str().parse().ok());
    if season != video.season {
        return false;
    }
    let episode: Option<i32> = caps.get(2).and_then(|m| m.as_str().parse().ok());
    if episode != video.episode {
        return false;
    }

    let tag_start = caps.get(0).map_or(0, |m| m.start());
    normalize_title(&strip_release_tokens(&cleaned[..tag_start])) == wanted
}

/// Remove resolution/source/codec tokens that sit next to the title
fn strip_release_tokens(text: &str) -> String {
    let patterns = &*PATTERNS;
    let mut out = text.to_string();
    for re in [
        &patterns.res_2160,
        &patterns.res_1080,
        &patterns.res_720,
        &patterns.res_sd,
        &patterns.junk_source,
        &patterns.high_source,
        &patterns.codec,
    ] {
        out = re.replace_all(&out, " ").to_string();
    }
    out
}

/// Strip dots/underscores so a release name reads like a title
pub fn clean_release_title(name: &str) -> String {
    name.replace(['.', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
