/// Events emitted during a simulation step.
/// The presentation layer consumes these for UI feedback.

#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(dead_code)]
pub enum GameEvent {
    CollectiblePicked { collected: u32, total: u32 },
    PlayerCaught { lives_left: u32 },
    GoalLocked { missing: u32 },
    LevelCleared,
    GameOver,
    Victory,
}
