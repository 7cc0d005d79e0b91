//! Run identifier generation.

use chrono::Utc;
use uuid::Uuid;

/// Generates human-sortable run identifiers: a UTC timestamp plus a short
/// random suffix, e.g. `run-20260807T141530-1f3a9c2d`.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdGenerator;

impl IdGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn generate_run_id(&self) -> String {
        let stamp = Utc::now().format("%Y%m%dT%H%M%S");
        let suffix = Uuid::new_v4().simple().to_string();
        format!("run-{stamp}-{}", &suffix[..8])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_ids_are_unique() {
        let generator = IdGenerator::new();
        assert_ne!(generator.generate_run_id(), generator.generate_run_id());
    }
}
