pub struct Icons;

impl Icons {
    pub const ROCKET: &str = "🚀";
    pub const CHECK: &str = "✅";
    pub const WARN: &str = "⚠️";
    pub const CLOCK: &str = "⏱️";
    pub const EMPTY: &str = "∅";
}
