use chrono::{DateTime, Utc};

/// Human-relative age of a post or comment as seen at `now`.
///
/// Under a minute reads "N seconds ago", under an hour "N minutes ago", under a
/// day "N hours ago"; anything older is an absolute `dd-mm-yyyy hh:mm` stamp.
/// Timestamps in the future count as zero seconds old.
pub fn relative_age_label(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - created_at).num_seconds().max(0);

    if seconds < 60 {
        format!("{} seconds ago", seconds)
    } else if seconds < 60 * 60 {
        format!("{} minutes ago", seconds / 60)
    } else if seconds < 24 * 60 * 60 {
        format!("{} hours ago", seconds / (60 * 60))
    } else {
        created_at.format("%d-%m-%Y %H:%M").to_string()
    }
}
