use serde::{Deserialize, Serialize};

use network::{Network, TimeFormat};

use crate::kml::KmlStyles;
use crate::timeline::{validate_delays, MovieWindow, TimelineParams};
use crate::MovieError;

/// Settings for one movie. Every field is optional in the JSON file; missing ones use the
/// defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovieConfig {
    /// When the movie starts. If missing, the earliest departure.
    pub begin: Option<String>,
    /// When the movie ends. If missing, the latest arrival, plus enough time for everything to
    /// fade.
    pub end: Option<String>,
    /// Seconds
    pub delay_node: i64,
    /// Seconds
    pub delay_link: i64,
    pub node_icon_href: String,
    pub node_icon_scale: f64,
    /// RGB
    pub link_color: [u8; 3],
    pub link_width: f64,
    pub sample_step: f64,
    pub output: String,
}

impl Default for MovieConfig {
    fn default() -> Self {
        Self {
            begin: None,
            end: None,
            delay_node: 100,
            delay_link: 100,
            node_icon_href: "http://bit.ly/1Q57CMA".to_string(),
            node_icon_scale: 0.5,
            link_color: [70, 147, 226],
            link_width: 5.0,
            sample_step: 0.05,
            output: "Movie.kml".to_string(),
        }
    }
}

impl MovieConfig {
    pub fn timeline_params(
        &self,
        network: &Network,
        time_format: &dyn TimeFormat,
    ) -> anyhow::Result<TimelineParams> {
        // Bound the delays before doing any arithmetic with them
        validate_delays(self.delay_node, self.delay_link)?;

        let range = network.time_range();
        let begin = match self.begin {
            Some(ref raw) => time_format.to_epoch(raw)?,
            None => match range {
                Some((earliest, _)) => earliest,
                None => return Err(no_window().into()),
            },
        };
        let end = match self.end {
            Some(ref raw) => time_format.to_epoch(raw)?,
            None => match range {
                Some((_, latest)) => latest
                    .checked_offset(self.delay_node.max(self.delay_link))
                    .ok_or_else(|| {
                        MovieError::InvalidConfig(format!("the movie can't end after {latest}"))
                    })?,
                None => return Err(no_window().into()),
            },
        };

        let params = TimelineParams {
            window: MovieWindow { begin, end },
            delay_node: self.delay_node,
            delay_link: self.delay_link,
            sample_step: self.sample_step,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn kml_styles(&self) -> KmlStyles {
        KmlStyles {
            node_icon_href: self.node_icon_href.clone(),
            node_icon_scale: self.node_icon_scale,
            link_color: self.link_color,
            link_width: self.link_width,
        }
    }
}

fn no_window() -> MovieError {
    MovieError::InvalidConfig(
        "there are no links, so begin and end must be specified explicitly".to_string(),
    )
}
