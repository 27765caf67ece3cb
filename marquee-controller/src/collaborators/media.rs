//! Media endpoint reached through a helper command
//!
//! Helper protocol, one `key=value` pair per line on stdout:
//!
//! | invocation                     | output                                   |
//! |--------------------------------|------------------------------------------|
//! | `discover`                     | `player=<name>` per endpoint             |
//! | `<name> coordinator`           | `coordinator=<name>`                     |
//! | `<name> play` / `<name> pause` | nothing                                  |
//! | `<name> volume [N]`            | `volume=<0-100>`                         |
//! | `<name> track`                 | `title=`, `artist=`, `album=`, `position=`, `duration=` |
//! | `<name> transport`             | `state=<PLAYING|PAUSED_PLAYBACK|STOPPED|TRANSITIONING>` |

use std::collections::BTreeMap;

use marquee_core::config::CollaboratorConfig;
use marquee_core::traits::{
    parse_key_values, CollaboratorError, Endpoint, MediaService, TrackInfo, TransportState,
};

use super::command::HelperCommand;

pub struct CommandMediaService {
    helper: HelperCommand,
}

impl CommandMediaService {
    pub fn new(helper: HelperCommand) -> Self {
        Self { helper }
    }

    pub fn from_config(config: &CollaboratorConfig) -> Self {
        Self::new(HelperCommand::new(
            config.media_command.clone(),
            Vec::new(),
            config.timeout(),
        ))
    }

    fn query(&self, endpoint: &Endpoint, args: &[&str]) -> Result<BTreeMap<String, String>, CollaboratorError> {
        let mut full = vec![endpoint.name.as_str()];
        full.extend_from_slice(args);
        self.helper.call(&full).map(|out| parse_key_values(&out))
    }
}

fn field(fields: &BTreeMap<String, String>, key: &str) -> Result<String, CollaboratorError> {
    fields
        .get(key)
        .cloned()
        .ok_or_else(|| CollaboratorError::Protocol(format!("missing {key}")))
}

fn parse_volume(fields: &BTreeMap<String, String>) -> Result<i32, CollaboratorError> {
    let raw = field(fields, "volume")?;
    raw.trim()
        .parse()
        .map_err(|_| CollaboratorError::Protocol(format!("bad volume {raw:?}")))
}

impl MediaService for CommandMediaService {
    fn discover(&self) -> Result<Vec<Endpoint>, CollaboratorError> {
        let out = self.helper.call(&["discover"])?;
        Ok(out
            .lines()
            .filter_map(|line| line.split_once('='))
            .filter(|(key, _)| key.trim() == "player")
            .map(|(_, name)| name.trim())
            .filter(|name| !name.is_empty())
            .map(Endpoint::new)
            .collect())
    }

    fn group_coordinator(&self, endpoint: &Endpoint) -> Result<Endpoint, CollaboratorError> {
        let fields = self.query(endpoint, &["coordinator"])?;
        field(&fields, "coordinator").map(Endpoint::new)
    }

    fn play(&self, endpoint: &Endpoint) -> Result<(), CollaboratorError> {
        self.query(endpoint, &["play"]).map(|_| ())
    }

    fn pause(&self, endpoint: &Endpoint) -> Result<(), CollaboratorError> {
        self.query(endpoint, &["pause"]).map(|_| ())
    }

    fn volume(&self, endpoint: &Endpoint) -> Result<i32, CollaboratorError> {
        parse_volume(&self.query(endpoint, &["volume"])?)
    }

    fn set_volume(&self, endpoint: &Endpoint, volume: i32) -> Result<(), CollaboratorError> {
        let volume = volume.clamp(0, 100).to_string();
        self.query(endpoint, &["volume", &volume]).map(|_| ())
    }

    fn track_info(&self, endpoint: &Endpoint) -> Result<TrackInfo, CollaboratorError> {
        let mut fields = self.query(endpoint, &["track"])?;
        let mut take = |key: &str| fields.remove(key).unwrap_or_default();
        Ok(TrackInfo {
            title: take("title"),
            artist: take("artist"),
            album: take("album"),
            position: take("position"),
            duration: take("duration"),
        })
    }

    fn transport_state(&self, endpoint: &Endpoint) -> Result<TransportState, CollaboratorError> {
        field(&self.query(endpoint, &["transport"])?, "state")?.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Service backed by a shell script standing in for the helper
    fn service(script: &str) -> CommandMediaService {
        CommandMediaService::new(HelperCommand::new(
            "/bin/sh",
            vec!["-c".into(), script.into(), "helper".into()],
            Duration::from_secs(5),
        ))
    }

    const FAKE_HELPER: &str = r#"
case "$1" in
  discover) printf 'player=Kitchen\nplayer=Living Room\nnoise\n' ;;
  *)
    case "$2" in
      coordinator) echo "coordinator=Living Room" ;;
      volume) echo "volume=${3:-35}" ;;
      track) printf 'title=Song = Title\nartist=Band\nposition=0:01:02\nduration=0:03:04\n' ;;
      transport) echo "state=PAUSED_PLAYBACK" ;;
      play|pause) ;;
      *) echo "unknown" >&2; exit 1 ;;
    esac ;;
esac
"#;

    fn kitchen() -> Endpoint {
        Endpoint::new("Kitchen")
    }

    #[test]
    fn test_discover() {
        let names: Vec<String> = service(FAKE_HELPER)
            .discover()
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Kitchen", "Living Room"]);
    }

    #[test]
    fn test_queries() {
        let media = service(FAKE_HELPER);
        assert_eq!(
            media.group_coordinator(&kitchen()).unwrap(),
            Endpoint::new("Living Room")
        );
        assert_eq!(media.volume(&kitchen()).unwrap(), 35);
        assert_eq!(media.transport_state(&kitchen()).unwrap(), TransportState::Paused);
        media.play(&kitchen()).unwrap();
        media.set_volume(&kitchen(), 140).unwrap();
    }

    #[test]
    fn test_track_info_missing_fields_blank() {
        let info = service(FAKE_HELPER).track_info(&kitchen()).unwrap();
        assert_eq!(info.title, "Song = Title");
        assert_eq!(info.artist, "Band");
        assert_eq!(info.album, "");
        assert_eq!(info.position, "0:01:02");
        assert_eq!(info.duration, "0:03:04");
    }

    #[test]
    fn test_protocol_errors() {
        let media = service("echo volume=loud");
        assert!(matches!(
            media.volume(&kitchen()),
            Err(CollaboratorError::Protocol(_))
        ));
        assert!(matches!(
            media.transport_state(&kitchen()),
            Err(CollaboratorError::Protocol(_))
        ));
    }
}
