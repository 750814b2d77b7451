use rand::seq::IndexedRandom;
use serde::Serialize;

const CONTENT: &str = "I hear that you're feeling overwhelmed. It's completely valid to feel that way. Taking a pause is productive, not lazy.";

struct Track {
    video_id: &'static str,
    title: &'static str,
    reason: &'static str,
}

const TRACKS: &[Track] = &[
    Track {
        video_id: "lTRiuFIWV54",
        title: "Slow Lofi for Focus",
        reason: "This track has a steady rhythm to help you ground your thoughts without distraction.",
    },
    Track {
        video_id: "jfKfPfyJRdk",
        title: "Lofi Hip Hop Radio",
        reason: "Soft beats with no lyrics give your mind room to settle.",
    },
    Track {
        video_id: "4xDzrJKXOOY",
        title: "Synthwave Radio",
        reason: "A warm, even tempo to carry you through a restless moment.",
    },
];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicData {
    pub video_id: String,
    pub title: String,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct WellnessReply {
    pub id: String,
    pub role: &'static str,
    pub content: &'static str,
    pub action: &'static str,
    pub music_data: MusicData,
}

pub fn respond() -> WellnessReply {
    let track = TRACKS.choose(&mut rand::rng()).unwrap_or(&TRACKS[0]);
    let millis = time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;

    WellnessReply {
        id: format!("msg_{millis}"),
        role: "assistant",
        content: CONTENT,
        action: "music_therapy",
        music_data: MusicData {
            video_id: track.video_id.to_owned(),
            title: track.title.to_owned(),
            reason: track.reason.to_owned(),
        },
    }
}
