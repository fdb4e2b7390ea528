use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How often a mission's task list is meant to be worked through.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimeFrame {
    Daily,
    Weekly,
    Monthly,
}

impl TimeFrame {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFrame::Daily => "daily",
            TimeFrame::Weekly => "weekly",
            TimeFrame::Monthly => "monthly",
        }
    }
}

impl FromStr for TimeFrame {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(TimeFrame::Daily),
            "weekly" => Ok(TimeFrame::Weekly),
            "monthly" => Ok(TimeFrame::Monthly),
            other => Err(format!("unknown time frame: {}", other)),
        }
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Symbolic icon attached to a task.
///
/// The tag set is closed; [`IconName::glyph`] is the exhaustive mapping to a
/// display glyph. Unknown tags deserialize to the default ([`IconName::Feather`])
/// so a single bad tag cannot poison a whole mission record.
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IconName {
    Book,
    Dumbbell,
    #[default]
    Feather,
    Leaf,
    Repeat,
    Coffee,
}

impl IconName {
    pub fn as_str(&self) -> &'static str {
        match self {
            IconName::Book => "Book",
            IconName::Dumbbell => "Dumbbell",
            IconName::Feather => "Feather",
            IconName::Leaf => "Leaf",
            IconName::Repeat => "Repeat",
            IconName::Coffee => "Coffee",
        }
    }

    /// Display glyph for the tag.
    pub fn glyph(&self) -> &'static str {
        match self {
            IconName::Book => "\u{1F4D6}",
            IconName::Dumbbell => "\u{1F3CB}",
            IconName::Feather => "\u{1FAB6}",
            IconName::Leaf => "\u{1F343}",
            IconName::Repeat => "\u{1F501}",
            IconName::Coffee => "\u{2615}",
        }
    }
}

impl FromStr for IconName {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Book" => Ok(IconName::Book),
            "Dumbbell" => Ok(IconName::Dumbbell),
            "Feather" => Ok(IconName::Feather),
            "Leaf" => Ok(IconName::Leaf),
            "Repeat" => Ok(IconName::Repeat),
            "Coffee" => Ok(IconName::Coffee),
            _ => Err(()),
        }
    }
}

impl<'de> Deserialize<'de> for IconName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let tag = String::deserialize(deserializer)?;
        Ok(tag.parse().unwrap_or_default())
    }
}

/// Media family of an uploaded artifact, derived from its MIME type.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

impl MediaKind {
    /// Derive the kind from a MIME type the way the client does: `image/*`
    /// and `video/*` map to their families, everything else is audio.
    pub fn from_mime(mime: &str) -> Self {
        if mime.starts_with("image") {
            MediaKind::Image
        } else if mime.starts_with("video") {
            MediaKind::Video
        } else {
            MediaKind::Audio
        }
    }
}

/// One motivational artifact attached to a mission.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub kind: MediaKind,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// A countable sub-goal within a mission.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Task {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completions: u32,
    pub target: u32,
    #[serde(default)]
    pub icon: IconName,
}

impl Task {
    /// A task is complete once its completion count reaches the target.
    pub fn is_complete(&self) -> bool {
        self.completions >= self.target
    }

    pub fn increment(&mut self) {
        self.completions = self.completions.saturating_add(1);
    }

    /// Decrement, clamped at zero.
    pub fn decrement(&mut self) {
        self.completions = self.completions.saturating_sub(1);
    }
}

/// One goal-tracking unit: tasks to repeat, a reward to unlock, and optional
/// motivational media. This is the client-facing shape; the storage row uses
/// flattened lowercase keys (see `database`).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Mission {
    pub id: String,
    pub title: String,
    pub reward: String,
    /// Empty string means the renderer substitutes a generated placeholder.
    #[serde(default)]
    pub reward_image: String,
    pub time_frame: TimeFrame,
    #[serde(default)]
    pub motivation: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub motivation_media: Vec<MediaItem>,
}

impl Mission {
    pub fn total_completions(&self) -> u32 {
        self.tasks.iter().map(|t| t.completions).sum()
    }

    pub fn total_target(&self) -> u32 {
        self.tasks.iter().map(|t| t.target).sum()
    }

    /// Overall progress in percent. Defined as 0 when the target sum is 0
    /// so an empty mission never divides by zero.
    pub fn progress(&self) -> f64 {
        let target = self.total_target();
        if target == 0 {
            return 0.0;
        }
        f64::from(self.total_completions()) / f64::from(target) * 100.0
    }

    pub fn completed_tasks(&self) -> usize {
        self.tasks.iter().filter(|t| t.is_complete()).count()
    }

    /// The reward lockbox opens once progress reaches 100%.
    pub fn reward_unlocked(&self) -> bool {
        self.progress() >= 100.0
    }
}

/// Create payload: a mission as the client submits it, before the store has
/// assigned ids.
#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewMission {
    pub title: String,
    pub reward: String,
    #[serde(default)]
    pub reward_image: Option<String>,
    pub time_frame: TimeFrame,
    #[serde(default)]
    pub motivation: Option<String>,
    #[serde(default)]
    pub tasks: Vec<NewTask>,
    #[serde(default)]
    pub motivation_media: Option<Vec<MediaItem>>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct NewTask {
    #[serde(default)]
    pub id: Option<String>,
    pub text: String,
    #[serde(default)]
    pub completions: u32,
    pub target: u32,
    #[serde(default)]
    pub icon: IconName,
}

impl NewMission {
    /// Materialize a full mission. Tasks without a client-supplied id get one
    /// derived from the creation timestamp and their position, unique enough
    /// for list rendering within the mission.
    pub fn into_mission(self, id: String, now_ms: i64) -> Mission {
        let tasks = self
            .tasks
            .into_iter()
            .enumerate()
            .map(|(index, task)| Task {
                id: task.id.unwrap_or_else(|| format!("{}-{}", now_ms, index)),
                text: task.text,
                completions: task.completions,
                target: task.target,
                icon: task.icon,
            })
            .collect();

        Mission {
            id,
            title: self.title,
            reward: self.reward,
            reward_image: self.reward_image.unwrap_or_default(),
            time_frame: self.time_frame,
            motivation: self.motivation.unwrap_or_default(),
            tasks,
            motivation_media: self.motivation_media.unwrap_or_default(),
        }
    }
}

/// Partial update payload. Absent fields are left untouched by the store.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct MissionPatch {
    pub title: Option<String>,
    pub reward: Option<String>,
    pub reward_image: Option<String>,
    pub time_frame: Option<TimeFrame>,
    pub motivation: Option<String>,
    pub tasks: Option<Vec<Task>>,
    pub motivation_media: Option<Vec<MediaItem>>,
}

impl MissionPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.reward.is_none()
            && self.reward_image.is_none()
            && self.time_frame.is_none()
            && self.motivation.is_none()
            && self.tasks.is_none()
            && self.motivation_media.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(completions: u32, target: u32) -> Task {
        Task {
            id: "t".to_string(),
            text: "task".to_string(),
            completions,
            target,
            icon: IconName::Book,
        }
    }

    fn mission(tasks: Vec<Task>) -> Mission {
        Mission {
            id: "m1".to_string(),
            title: "X".to_string(),
            reward: "Y".to_string(),
            reward_image: String::new(),
            time_frame: TimeFrame::Daily,
            motivation: String::new(),
            tasks,
            motivation_media: Vec::new(),
        }
    }

    #[test]
    fn progress_is_zero_without_targets() {
        assert_eq!(mission(Vec::new()).progress(), 0.0);
        assert_eq!(mission(vec![task(3, 0)]).progress(), 0.0);
    }

    #[test]
    fn progress_hits_hundred_only_when_every_task_is_complete() {
        let done = mission(vec![task(1, 1), task(3, 3)]);
        assert_eq!(done.progress(), 100.0);
        assert!(done.reward_unlocked());

        let partial = mission(vec![task(1, 1), task(2, 3)]);
        assert!(partial.progress() < 100.0);
        assert!(!partial.reward_unlocked());
    }

    #[test]
    fn overshooting_tasks_can_push_progress_past_hundred() {
        // completions are not clamped to the target
        let m = mission(vec![task(4, 2)]);
        assert!(m.progress() > 100.0);
        assert!(m.reward_unlocked());
    }

    #[test]
    fn decrement_saturates_at_zero() {
        let mut t = task(0, 2);
        t.decrement();
        assert_eq!(t.completions, 0);
        t.increment();
        t.decrement();
        assert_eq!(t.completions, 0);
    }

    #[test]
    fn create_scenario_moves_progress_from_zero_to_hundred() {
        let new = NewMission {
            title: "X".to_string(),
            reward: "Y".to_string(),
            reward_image: None,
            time_frame: TimeFrame::Daily,
            motivation: None,
            tasks: vec![NewTask {
                id: None,
                text: "A".to_string(),
                completions: 0,
                target: 2,
                icon: IconName::Book,
            }],
            motivation_media: None,
        };
        let mut m = new.into_mission("m1".to_string(), 1_700_000_000_000);
        assert_eq!(m.tasks[0].completions, 0);
        assert_eq!(m.tasks[0].id, "1700000000000-0");
        assert_eq!(m.progress(), 0.0);

        m.tasks[0].increment();
        m.tasks[0].increment();
        assert_eq!(m.progress(), 100.0);
    }

    #[test]
    fn unknown_icon_tags_fall_back_to_feather() {
        let t: Task =
            serde_json::from_str(r#"{"id":"1","text":"A","target":1,"icon":"Sword"}"#).unwrap();
        assert_eq!(t.icon, IconName::Feather);
        let t: Task = serde_json::from_str(r#"{"id":"1","text":"A","target":1}"#).unwrap();
        assert_eq!(t.icon, IconName::Feather);
    }

    #[test]
    fn known_icon_tags_round_trip() {
        for tag in ["Book", "Dumbbell", "Feather", "Leaf", "Repeat", "Coffee"] {
            let icon: IconName = serde_json::from_value(serde_json::json!(tag)).unwrap();
            assert_eq!(icon.as_str(), tag);
            assert!(!icon.glyph().is_empty());
        }
    }

    #[test]
    fn media_kind_follows_mime_family() {
        assert_eq!(MediaKind::from_mime("image/png"), MediaKind::Image);
        assert_eq!(MediaKind::from_mime("video/mp4"), MediaKind::Video);
        assert_eq!(MediaKind::from_mime("audio/mpeg"), MediaKind::Audio);
        // anything unrecognized lands in audio, matching the client
        assert_eq!(MediaKind::from_mime("application/pdf"), MediaKind::Audio);
    }

    #[test]
    fn client_json_uses_camel_case_keys() {
        let m = mission(vec![task(0, 1)]);
        let value = serde_json::to_value(&m).unwrap();
        assert!(value.get("rewardImage").is_some());
        assert!(value.get("timeFrame").is_some());
        assert!(value.get("motivationMedia").is_some());
        assert!(value.get("rewardimage").is_none());
        assert_eq!(value["timeFrame"], "daily");
    }

    #[test]
    fn patch_reports_emptiness() {
        assert!(MissionPatch::default().is_empty());
        let patch: MissionPatch = serde_json::from_str(r#"{"title":"New"}"#).unwrap();
        assert!(!patch.is_empty());
    }
}
