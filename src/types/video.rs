use serde::{Deserialize, Serialize};

/// What kind of item a request targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VideoType {
    #[default]
    Movie,
    Show,
    Season,
    Episode,
}

impl std::fmt::Display for VideoType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Movie => write!(f, "movie"),
            Self::Show => write!(f, "show"),
            Self::Season => write!(f, "season"),
            Self::Episode => write!(f, "episode"),
        }
    }
}

/// External IDs for cross-referencing a video between services
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIds {
    pub trakt: Option<u64>,
    pub imdb: Option<String>,
    pub tmdb: Option<u64>,
    pub tvdb: Option<u64>,
    pub slug: Option<String>,
}

impl ExternalIds {
    /// Check if any ID is set
    pub fn has_any(&self) -> bool {
        self.trakt.is_some()
            || self.imdb.is_some()
            || self.tmdb.is_some()
            || self.tvdb.is_some()
            || self.slug.is_some()
    }

    /// Merge with another set, preferring non-None values from other
    pub fn merge(&mut self, other: &ExternalIds) {
        if other.trakt.is_some() {
            self.trakt = other.trakt;
        }
        if other.imdb.is_some() {
            self.imdb = other.imdb.clone();
        }
        if other.tmdb.is_some() {
            self.tmdb = other.tmdb;
        }
        if other.tvdb.is_some() {
            self.tvdb = other.tvdb;
        }
        if other.slug.is_some() {
            self.slug = other.slug.clone();
        }
    }
}

/// A playback request target, passed into every scraper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    /// Request kind
    pub video_type: VideoType,
    /// Title to search for
    pub title: String,
    /// Release year (movies) or first-aired year (shows)
    pub year: Option<i32>,
    /// Season number (1-indexed)
    pub season: Option<i32>,
    /// Episode number (1-indexed)
    pub episode: Option<i32>,
    /// Episode title, when known
    pub ep_title: Option<String>,
    /// IDs on external services
    pub ids: ExternalIds,
}

impl Video {
    /// Create a movie request
    pub fn movie(title: impl Into<String>, year: Option<i32>) -> Self {
        Self {
            video_type: VideoType::Movie,
            title: title.into(),
            year,
            season: None,
            episode: None,
            ep_title: None,
            ids: ExternalIds::default(),
        }
    }

    /// Create a season-pack request
    pub fn season(title: impl Into<String>, season: i32) -> Self {
        Self {
            video_type: VideoType::Season,
            title: title.into(),
            year: None,
            season: Some(season),
            episode: None,
            ep_title: None,
            ids: ExternalIds::default(),
        }
    }

    /// Create an episode request
    pub fn episode(title: impl Into<String>, season: i32, episode: i32) -> Self {
        Self {
            video_type: VideoType::Episode,
            title: title.into(),
            year: None,
            season: Some(season),
            episode: Some(episode),
            ep_title: None,
            ids: ExternalIds::default(),
        }
    }

    /// Builder pattern: set year
    pub fn with_year(mut self, year: Option<i32>) -> Self {
        self.year = year;
        self
    }

    /// Builder pattern: set episode title
    pub fn with_ep_title(mut self, title: impl Into<String>) -> Self {
        self.ep_title = Some(title.into());
        self
    }

    /// Builder pattern: set Trakt ID
    pub fn with_trakt_id(mut self, id: u64) -> Self {
        self.ids.trakt = Some(id);
        self
    }

    /// Builder pattern: set IMDB ID
    pub fn with_imdb_id(mut self, id: impl Into<String>) -> Self {
        self.ids.imdb = Some(id.into());
        self
    }

    /// Builder pattern: set TMDB ID
    pub fn with_tmdb_id(mut self, id: u64) -> Self {
        self.ids.tmdb = Some(id);
        self
    }

    pub fn is_movie(&self) -> bool {
        self.video_type == VideoType::Movie
    }

    /// Search term a scraper would type into a site's search box
    pub fn search_term(&self) -> String {
        match (self.video_type, self.season, self.episode) {
            (VideoType::Episode, Some(s), Some(e)) => {
                format!("{} S{s:02}E{e:02}", self.title)
            }
            (VideoType::Season, Some(s), _) => format!("{} S{s:02}", self.title),
            _ => match self.year {
                Some(year) => format!("{} {year}", self.title),
                None => self.title.clone(),
            },
        }
    }

    /// Stable identity used for per-video caching
    pub fn cache_key(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}",
            self.video_type,
            self.title.to_lowercase(),
            self.year.unwrap_or(0),
            self.season.unwrap_or(0),
            self.episode.unwrap_or(0),
        )
    }
}
