/// Full-screen text slides shown outside (or between) trials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageScreen {
    Instructions,
    ExperimenterWait,
    TriggerWait,
    Thanks,
}

/// What the front end should be drawing right now. Produced by the driver,
/// consumed by the renderer; neither side needs to know about the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState<'a> {
    Message(MessageScreen),
    /// Stimulus identifier from the fixture's `image_name` column.
    Stimulus(&'a str),
    /// Fixation identifier from the paired fixture row.
    Fixation(&'a str),
    Blank,
}
