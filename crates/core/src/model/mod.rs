mod account;
mod ids;
mod progress;
mod remote_settings;
mod study_session;

pub use ids::{ChapterId, ChapterIdParts, ParseIdError, StudySessionId, UserId};

pub use account::{
    Credentials, CredentialsDraft, CredentialsError, MIN_PASSWORD_LEN, UserIdentity,
};
pub use progress::{
    ChapterProgress, ChapterProgressPatch, ProgressError, ProgressMap, Understanding,
    subtopic_key,
};
pub use remote_settings::{RemoteSettings, RemoteSettingsDraft, RemoteSettingsError};
pub use study_session::{
    DailyStudyTotals, StudySession, StudySessionError, TRACKED_SUBJECTS, total_on,
    weekly_breakdown,
};
