use glam::Vec3;
use lightfield_kernel::{BoxField, RegimeCounts};

/// Field inspector for developer tooling.
///
/// Read-only queries against the field for debugging and the debug panel.
pub struct FieldInspector;

impl FieldInspector {
    /// Produce a summary of the field state.
    pub fn summary(field: &BoxField) -> FieldSummary {
        FieldSummary {
            instance_count: field.instance_count(),
            generation: field.batch().generation(),
            frames: field.frames(),
            light_position: field.light().position(),
            regimes: field.last_regimes(),
        }
    }

    /// Details of one instance, or `None` when `index` is out of range.
    pub fn inspect_instance(field: &BoxField, index: usize) -> Option<InstanceInfo> {
        let batch = field.batch();
        let instance = batch.instance(index)?;
        let transform = batch.transform(index)?;
        Some(InstanceInfo {
            index,
            origin: instance.origin.to_array(),
            position: transform.position.to_array(),
            scale: transform.scale.to_array(),
            mass: instance.mass,
            displacement: transform.position.distance(instance.origin),
            distance_to_light: transform.position.distance(field.light().position()),
        })
    }

    /// Indices of the instances currently displaced from their origin by more
    /// than `tolerance`.
    pub fn displaced(field: &BoxField, tolerance: f32) -> Vec<usize> {
        let batch = field.batch();
        batch
            .instances()
            .iter()
            .zip(batch.transforms())
            .enumerate()
            .filter(|(_, (b, t))| t.position.distance(b.origin) > tolerance)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Summary of field state for the inspector.
#[derive(Debug, Clone)]
pub struct FieldSummary {
    pub instance_count: usize,
    pub generation: u64,
    pub frames: u64,
    pub light_position: Vec3,
    /// Regime tally of the most recent step.
    pub regimes: RegimeCounts,
}

impl std::fmt::Display for FieldSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let l = self.light_position;
        write!(
            f,
            "Field: boxes={} generation={} frames={} light=({:.2}, {:.2}, {:.2}) \
             attracted={} holding={} returning={}",
            self.instance_count,
            self.generation,
            self.frames,
            l.x,
            l.y,
            l.z,
            self.regimes.attraction,
            self.regimes.hysteresis,
            self.regimes.return_to_origin,
        )
    }
}

/// Detailed info about a single box.
#[derive(Debug, Clone)]
pub struct InstanceInfo {
    pub index: usize,
    pub origin: [f32; 3],
    pub position: [f32; 3],
    pub scale: [f32; 3],
    pub mass: f32,
    pub displacement: f32,
    pub distance_to_light: f32,
}

impl std::fmt::Display for InstanceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Box #{} pos=({:.3}, {:.3}, {:.3}) mass={:.3} displaced={:.4} light={:.3}",
            self.index,
            self.position[0],
            self.position[1],
            self.position[2],
            self.mass,
            self.displacement,
            self.distance_to_light,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lightfield_kernel::SceneConfig;

    fn field(count: usize) -> (SceneConfig, BoxField) {
        let config = SceneConfig::default();
        let field = BoxField::with_count(&config, count, 11);
        (config, field)
    }

    #[test]
    fn summary_fresh_field() {
        let (_, field) = field(40);
        let summary = FieldInspector::summary(&field);
        assert_eq!(summary.instance_count, 40);
        assert_eq!(summary.generation, 1);
        assert_eq!(summary.frames, 0);
        assert_eq!(summary.regimes.total(), 0);
    }

    #[test]
    fn summary_after_step() {
        let (config, mut field) = field(40);
        field.step(0.016, &config);
        let summary = FieldInspector::summary(&field);
        assert_eq!(summary.frames, 1);
        assert_eq!(summary.regimes.total(), 40);
    }

    #[test]
    fn inspect_instance_found() {
        let (_, field) = field(5);
        let info = FieldInspector::inspect_instance(&field, 2).unwrap();
        let instance = field.batch().instance(2).unwrap();
        assert_eq!(info.origin, instance.origin.to_array());
        assert_eq!(info.position, info.origin);
        assert_eq!(info.displacement, 0.0);
        assert!(info.mass > 0.0);
    }

    #[test]
    fn inspect_instance_out_of_range() {
        let (_, field) = field(5);
        assert!(FieldInspector::inspect_instance(&field, 5).is_none());
    }

    #[test]
    fn nothing_displaced_at_rest() {
        let (_, field) = field(30);
        assert!(FieldInspector::displaced(&field, 1e-6).is_empty());
    }

    #[test]
    fn summary_display() {
        let (_, field) = field(3);
        let s = format!("{}", FieldInspector::summary(&field));
        assert!(s.contains("boxes=3"));
        assert!(s.contains("frames=0"));
    }
}
