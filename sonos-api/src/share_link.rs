//! Music-service references to Sonos transport URIs
//!
//! Tags name content the way the services do (`spotify:album:<id>`,
//! `song:<id>`, `tunein/play/<station>`). A speaker needs a service-specific
//! URI plus DIDL metadata carrying the account token, and containers have to
//! go through the queue rather than the transport URI.

use crate::didl::item_metadata;
use crate::{ApiError, Result};

const SPOTIFY_TOKEN: &str = "SA_RINCON2311_X_#Svc2311-0-Token";
const APPLE_MUSIC_TOKEN: &str = "SA_RINCON52231_X_#Svc52231-0-Token";
const AMAZON_MUSIC_TOKEN: &str = "SA_RINCON51463_X_#Svc51463-0-Token";
const TUNEIN_TOKEN: &str = "SA_RINCON65031_";

const CLASS_TRACK: &str = "object.item.audioItem.musicTrack";
const CLASS_ALBUM: &str = "object.container.album.musicAlbum";
const CLASS_PLAYLIST: &str = "object.container.playlistContainer";
const CLASS_BROADCAST: &str = "object.item.audioItem.audioBroadcast";
const CLASS_PODCAST: &str = "object.item.audioItem.podcast";

/// How a resolved reference has to be started on a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayMode {
    /// Set as the transport URI and play (radio streams)
    Stream,
    /// Append to the queue, point the transport at the queue, then play
    Queue,
}

/// A service reference resolved to something a speaker can play
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playable {
    pub uri: String,
    pub metadata: String,
    pub mode: PlayMode,
}

impl Playable {
    fn queued(uri: String, item_id: &str, class: &str, token: &str) -> Self {
        Self {
            uri,
            metadata: item_metadata(item_id, "", class, token),
            mode: PlayMode::Queue,
        }
    }
}

/// Resolve `spotify:<type>:<id>` (or an open.spotify.com link)
pub fn spotify(reference: &str) -> Result<Playable> {
    let (kind, id) = typed_id(
        reference,
        &["track", "album", "playlist", "artist", "episode"],
    )
    .ok_or_else(|| invalid("Spotify", reference))?;

    let encoded = format!("spotify%3a{}%3a{}", kind, id);
    let playable = match kind {
        "track" | "episode" => {
            let class = if kind == "track" { CLASS_TRACK } else { CLASS_PODCAST };
            Playable::queued(
                format!("x-sonos-spotify:{}?sid=9&flags=8224&sn=1", encoded),
                &format!("00032020{}", encoded),
                class,
                SPOTIFY_TOKEN,
            )
        }
        "album" => Playable::queued(
            format!("x-rincon-cpcontainer:0004206c{}", encoded),
            &format!("0004206c{}", encoded),
            CLASS_ALBUM,
            SPOTIFY_TOKEN,
        ),
        "playlist" => Playable::queued(
            format!("x-rincon-cpcontainer:1006206c{}", encoded),
            &format!("1006206c{}", encoded),
            CLASS_PLAYLIST,
            SPOTIFY_TOKEN,
        ),
        _ => {
            let top_tracks = format!("spotify%3aartistTopTracks%3a{}", id);
            Playable::queued(
                format!("x-rincon-cpcontainer:000e206c{}", top_tracks),
                &format!("000e206c{}", top_tracks),
                CLASS_PLAYLIST,
                SPOTIFY_TOKEN,
            )
        }
    };
    Ok(playable)
}

/// Resolve `song:<id>`, `album:<id>` or `playlist:<id>` in Apple Music
pub fn apple_music(reference: &str) -> Result<Playable> {
    let (kind, id) = typed_id(reference, &["song", "album", "playlist"])
        .ok_or_else(|| invalid("Apple Music", reference))?;

    let playable = match kind {
        "song" => Playable::queued(
            format!("x-sonos-http:song%3a{}.mp4?sid=204&flags=8224&sn=4", id),
            &format!("10032020song%3a{}", id),
            CLASS_TRACK,
            APPLE_MUSIC_TOKEN,
        ),
        "album" => Playable::queued(
            format!("x-rincon-cpcontainer:0004206calbum%3a{}", id),
            &format!("0004206calbum%3a{}", id),
            CLASS_ALBUM,
            APPLE_MUSIC_TOKEN,
        ),
        _ => Playable::queued(
            format!("x-rincon-cpcontainer:1006206cplaylist%3a{}", id),
            &format!("1006206cplaylist%3a{}", id),
            CLASS_PLAYLIST,
            APPLE_MUSIC_TOKEN,
        ),
    };
    Ok(playable)
}

/// Resolve `song:<asin>` or `album:<asin>` in Amazon Music
pub fn amazon_music(reference: &str) -> Result<Playable> {
    let (kind, id) =
        typed_id(reference, &["song", "album"]).ok_or_else(|| invalid("Amazon Music", reference))?;

    let playable = if kind == "song" {
        Playable::queued(
            format!(
                "x-sonosapi-hls-static:catalog%2ftracks%2f{}%2f?sid=201&flags=0&sn=1",
                id
            ),
            &format!("10030000catalog%2ftracks%2f{}%2f", id),
            CLASS_TRACK,
            AMAZON_MUSIC_TOKEN,
        )
    } else {
        Playable::queued(
            format!(
                "x-rincon-cpcontainer:1004206ccatalog%2falbums%2f{}%2f%23album_desc",
                id
            ),
            &format!("1004206ccatalog%2falbums%2f{}%2f%23album_desc", id),
            CLASS_ALBUM,
            AMAZON_MUSIC_TOKEN,
        )
    };
    Ok(playable)
}

/// Resolve a TuneIn station: `tunein/play/<id>`, `tunein:s<id>` or a bare id
pub fn tunein(reference: &str) -> Result<Playable> {
    let station = reference
        .rsplit(['/', ':'])
        .next()
        .map(|s| s.trim().trim_start_matches(['s', 'S']))
        .filter(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
        .ok_or_else(|| invalid("TuneIn", reference))?;

    Ok(Playable {
        uri: format!("x-sonosapi-stream:s{}?sid=254&flags=8224&sn=0", station),
        metadata: item_metadata(
            &format!("F00092020s{}", station),
            "",
            CLASS_BROADCAST,
            TUNEIN_TOKEN,
        ),
        mode: PlayMode::Stream,
    })
}

/// The queue URI of a zone player, used after enqueueing a container
pub fn queue_uri(rincon_id: &str) -> String {
    format!("x-rincon-queue:{}#0", rincon_id)
}

/// Find the last `<type><sep><id>` pair where `<type>` is one of `kinds`
fn typed_id<'a>(reference: &'a str, kinds: &[&'static str]) -> Option<(&'static str, &'a str)> {
    let segments: Vec<&str> = reference
        .trim()
        .split(['/', ':'])
        .filter(|s| !s.is_empty())
        .collect();

    segments.windows(2).rev().find_map(|pair| {
        let kind = kinds.iter().find(|k| k.eq_ignore_ascii_case(pair[0]))?;
        let id = pair[1].split(['?', '#']).next().unwrap_or_default();
        is_plain_id(id).then_some((*kind, id))
    })
}

fn is_plain_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

fn invalid(service: &str, reference: &str) -> ApiError {
    ApiError::InvalidParameter(format!(
        "'{}' is not a playable {} reference",
        reference, service
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spotify_track() {
        let playable = spotify("spotify:track:4uLU6hMCjMI75M1A2tKUQC").unwrap();
        assert_eq!(
            playable.uri,
            "x-sonos-spotify:spotify%3atrack%3a4uLU6hMCjMI75M1A2tKUQC?sid=9&flags=8224&sn=1"
        );
        assert_eq!(playable.mode, PlayMode::Queue);
        assert!(playable.metadata.contains("00032020spotify%3atrack%3a4uLU6hMCjMI75M1A2tKUQC"));
        assert!(playable.metadata.contains(SPOTIFY_TOKEN));
    }

    #[test]
    fn test_spotify_album_from_share_url() {
        let playable =
            spotify("https://open.spotify.com/album/1DFixLWuPkv3KT3TnV35m3?si=abc").unwrap();
        assert_eq!(
            playable.uri,
            "x-rincon-cpcontainer:0004206cspotify%3aalbum%3a1DFixLWuPkv3KT3TnV35m3"
        );
        assert!(playable.metadata.contains(CLASS_ALBUM));
    }

    #[test]
    fn test_spotify_user_playlist_uses_last_pair() {
        let playable = spotify("spotify:user:someone:playlist:37i9dQZF1DX").unwrap();
        assert_eq!(
            playable.uri,
            "x-rincon-cpcontainer:1006206cspotify%3aplaylist%3a37i9dQZF1DX"
        );
    }

    #[test]
    fn test_spotify_without_id_is_rejected() {
        assert!(matches!(
            spotify("spotify:"),
            Err(ApiError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_apple_music_song_and_playlist() {
        let song = apple_music("song:1440857781").unwrap();
        assert_eq!(
            song.uri,
            "x-sonos-http:song%3a1440857781.mp4?sid=204&flags=8224&sn=4"
        );

        let playlist = apple_music("playlist:pl.f4d106fed2bd41149aaacabb233eb5eb").unwrap();
        assert_eq!(
            playlist.uri,
            "x-rincon-cpcontainer:1006206cplaylist%3apl.f4d106fed2bd41149aaacabb233eb5eb"
        );
    }

    #[test]
    fn test_amazon_music_album() {
        let album = amazon_music("album:B0064WU1DA").unwrap();
        assert!(album.uri.starts_with("x-rincon-cpcontainer:1004206ccatalog%2falbums%2fB0064WU1DA"));
        assert!(album.metadata.contains(AMAZON_MUSIC_TOKEN));
    }

    #[test]
    fn test_tunein_forms() {
        for reference in ["tunein/play/34682", "tunein:s34682", "TuneIn/play/s34682", "34682"] {
            let playable = tunein(reference).unwrap();
            assert_eq!(
                playable.uri,
                "x-sonosapi-stream:s34682?sid=254&flags=8224&sn=0",
                "reference {}",
                reference
            );
            assert_eq!(playable.mode, PlayMode::Stream);
        }
        assert!(tunein("tunein/play/").is_err());
        assert!(tunein("tunein/play/abc").is_err());
    }

    #[test]
    fn test_queue_uri() {
        assert_eq!(queue_uri("RINCON_000E58A0123401400"), "x-rincon-queue:RINCON_000E58A0123401400#0");
    }
}
