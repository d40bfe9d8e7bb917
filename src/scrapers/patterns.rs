use regex::Regex;
use std::sync::LazyLock;

/// Pre-compiled regex patterns shared by the scrapers and quality guessing
pub struct Patterns {
    // Resolution tokens
    pub res_2160: Regex,
    pub res_1080: Regex,
    pub res_720: Regex,
    pub res_sd: Regex,

    // Source tokens
    pub junk_source: Regex, // cam/telesync class rips
    pub junk_extra: Regex,  // samples, trailers
    pub high_source: Regex, // decent non-HD sources

    // Codec tokens
    pub codec: Regex,

    // Free-form metadata inside release titles
    pub size: Regex,
    pub seeders: Regex,

    // Episode tags
    pub season_episode: Regex,   // S01E01, s1e1
    pub season_x_episode: Regex, // 1x01
    pub season_pack: Regex,      // S01, Season 1

    // Magnet links
    pub info_hash: Regex,

    // Year: 1900-2099
    pub year: Regex,
}

impl Patterns {
    pub fn new() -> Self {
        Self {
            res_2160: Regex::new(r"(?i)\b(2160p|4k|uhd)\b").expect("Invalid res_2160 regex"),
            res_1080: Regex::new(r"(?i)\b1080[pi]\b").expect("Invalid res_1080 regex"),
            res_720: Regex::new(r"(?i)\b720p\b").expect("Invalid res_720 regex"),
            res_sd: Regex::new(r"(?i)\b(480p|576p)\b").expect("Invalid res_sd regex"),

            junk_source: Regex::new(
                r"(?i)\b(cam(rip)?|hd-?cam|hd-?ts|ts|tc|telesync|tele-?cine|ts-?rip|dvd-?scr|screener|scr|r5|workprint)\b",
            )
            .expect("Invalid junk_source regex"),
            junk_extra: Regex::new(r"(?i)\b(sample|trailer|extras only)\b")
                .expect("Invalid junk_extra regex"),
            high_source: Regex::new(
                r"(?i)\b(hdtv|dvd-?rip|bd-?rip|br-?rip|blu-?ray|web-?dl|web-?rip|remux)\b",
            )
            .expect("Invalid high_source regex"),

            codec: Regex::new(r"(?i)\b(x264|x265|h\.?264|h\.?265|hevc|avc|xvid|divx|vp9|av1)\b")
                .expect("Invalid codec regex"),

            size: Regex::new(r"(?i)([\d.,]+)\s*([KMGT]i?B|B)\b").expect("Invalid size regex"),
            seeders: Regex::new(r"(?i)(?:👤|seed(?:er)?s?)\s*:?\s*(\d+)")
                .expect("Invalid seeders regex"),

            season_episode: Regex::new(r"(?i)\b[Ss](\d{1,2})[Ee](\d{1,3})\b")
                .expect("Invalid season_episode regex"),
            season_x_episode: Regex::new(r"\b(\d{1,2})[xX](\d{1,3})\b")
                .expect("Invalid season_x_episode regex"),
            season_pack: Regex::new(r"(?i)\bs(?:eason[ ._-]?)?(\d{1,2})\b")
                .expect("Invalid season_pack regex"),

            info_hash: Regex::new(r"(?i)btih:([a-f0-9]{40}|[a-z2-7]{32})")
                .expect("Invalid info_hash regex"),

            year: Regex::new(r"\b(19|20)\d{2}\b").expect("Invalid year regex"),
        }
    }
}

impl Default for Patterns {
    fn default() -> Self {
        Self::new()
    }
}

/// Global singleton for patterns
pub static PATTERNS: LazyLock<Patterns> = LazyLock::new(Patterns::new);
