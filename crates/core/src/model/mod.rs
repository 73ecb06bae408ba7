mod activity;
mod child;
mod ids;
mod letter;
mod progress;

pub use ids::{ActivityId, ChildId, IdError, ParseIdError, ProgressId, MAX_ACTIVITY_ID_LEN};
pub use letter::{FALLBACK_LETTER, Letter};

pub use activity::{
    Activity, ActivityError, ActivityType, DEFAULT_ESTIMATED_MINUTES, DEFAULT_MINIMUM_AGE,
    DEFAULT_POINTS_VALUE,
};
pub use child::{
    Avatar, Child, ChildError, MAX_CHILD_AGE, MAX_CHILD_NAME_LEN, MIN_CHILD_AGE, POINTS_PER_LEVEL,
    PointsAward, Track,
};
pub use progress::{MasteryLevel, ProgressError, ProgressRecord};
