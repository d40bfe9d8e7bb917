use crate::scrapers::patterns::PATTERNS;
use serde::{Deserialize, Serialize};

/// Stream quality, ordered worst to best
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    /// Cam/telesync rips
    Low,
    #[default]
    Sd,
    /// Good non-HD sources (HDTV, DVD rips)
    High,
    Hd720,
    Hd1080,
    Uhd4k,
}

impl Quality {
    /// Classify a release name by its resolution and source tokens.
    ///
    /// Resolution wins over source: a "1080p CAM" does not exist in the
    /// wild, but a "HDTV 720p" does and is 720p.
    pub fn from_release_name(name: &str) -> Self {
        let patterns = &*PATTERNS;

        if patterns.res_2160.is_match(name) {
            return Self::Uhd4k;
        }
        if patterns.res_1080.is_match(name) {
            return Self::Hd1080;
        }
        if patterns.res_720.is_match(name) {
            return Self::Hd720;
        }
        if patterns.junk_source.is_match(name) {
            return Self::Low;
        }
        if patterns.res_sd.is_match(name) {
            return Self::Sd;
        }
        if patterns.high_source.is_match(name) {
            return Self::High;
        }

        Self::Sd
    }

    /// Map an explicit site label ("HD", "CAM", "4K") to a quality
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_uppercase().as_str() {
            "4K" | "2160P" | "UHD" => Self::Uhd4k,
            "1080P" | "FHD" => Self::Hd1080,
            "HD" | "720P" => Self::Hd720,
            "HIGH" | "HDTV" | "DVD" => Self::High,
            "CAM" | "TS" | "TC" | "HDCAM" | "SCR" => Self::Low,
            _ => Self::Sd,
        }
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Sd => write!(f, "sd"),
            Self::High => write!(f, "high"),
            Self::Hd720 => write!(f, "720p"),
            Self::Hd1080 => write!(f, "1080p"),
            Self::Uhd4k => write!(f, "4k"),
        }
    }
}

/// Whether a release name should be discarded outright (cam rips, samples)
pub fn is_junk_release(name: &str) -> bool {
    let patterns = &*PATTERNS;
    patterns.junk_source.is_match(name) || patterns.junk_extra.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_ordering() {
        assert!(Quality::Uhd4k > Quality::Hd1080);
        assert!(Quality::Hd1080 > Quality::Hd720);
        assert!(Quality::Hd720 > Quality::High);
        assert!(Quality::High > Quality::Sd);
        assert!(Quality::Sd > Quality::Low);
    }

    #[test]
    fn test_from_release_name_resolution() {
        assert_eq!(
            Quality::from_release_name("The.Matrix.1999.2160p.UHD.BluRay.x265"),
            Quality::Uhd4k
        );
        assert_eq!(
            Quality::from_release_name("The.Matrix.1999.1080p.BluRay.x264-GROUP"),
            Quality::Hd1080
        );
        assert_eq!(
            Quality::from_release_name("Breaking.Bad.S01E01.720p.HDTV.x264"),
            Quality::Hd720
        );
    }

    #[test]
    fn test_from_release_name_source_tokens() {
        assert_eq!(
            Quality::from_release_name("New.Movie.2024.HDCAM.x264"),
            Quality::Low
        );
        assert_eq!(
            Quality::from_release_name("Some.Show.S02E03.HDTV.x264"),
            Quality::High
        );
        assert_eq!(Quality::from_release_name("Old.Movie.1985.DVDRip"), Quality::High);
        assert_eq!(Quality::from_release_name("Unknown Release"), Quality::Sd);
    }

    #[test]
    fn test_resolution_beats_source() {
        assert_eq!(
            Quality::from_release_name("Some.Show.HDTV.720p"),
            Quality::Hd720
        );
    }

    #[test]
    fn test_from_label() {
        assert_eq!(Quality::from_label("4k"), Quality::Uhd4k);
        assert_eq!(Quality::from_label("1080p"), Quality::Hd1080);
        assert_eq!(Quality::from_label("HD"), Quality::Hd720);
        assert_eq!(Quality::from_label("CAM"), Quality::Low);
        assert_eq!(Quality::from_label("whatever"), Quality::Sd);
    }

    #[test]
    fn test_junk_release() {
        assert!(is_junk_release("New.Movie.2024.HDCAM.x264"));
        assert!(is_junk_release("New.Movie.2024.TELESYNC"));
        assert!(is_junk_release("New.Movie.2024.TS.x264"));
        assert!(is_junk_release("Movie.2024.1080p.SAMPLE.mkv"));
        assert!(!is_junk_release("The.Matrix.1999.1080p.BluRay.x264"));
    }
}
