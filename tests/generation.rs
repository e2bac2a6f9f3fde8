use approx::assert_relative_eq;
use glam::Vec3;
use lsystem_tube::{
    GenerationContext, GeneratorError, LSystem, MAX_ITERATIONS, MeshBuffer, MeshConfig,
    MeshInterpreter, RuleTable, TubeBuilder,
};
use std::cell::RefCell;

fn bush() -> LSystem {
    LSystem::new(
        "X",
        RuleTable::new()
            .with_rule('X', "F[<+X][>-X]FX")
            .with_rule('F', "FF"),
    )
}

#[test]
fn test_default_config_matches_tool_defaults() {
    let config = MeshConfig::default();
    assert_eq!(config.iterations, 1);
    assert_eq!(config.distance_per_step, 1.0);
    assert_eq!(config.angle_per_step, 45.0);
    assert_eq!(config.start_diameter, 1.0);
    assert_eq!(config.end_diameter, 1.0);
    assert_eq!(config.validate(), Ok(()));
    assert!(!config.is_expensive());
}

#[test]
fn test_invalid_configs_are_rejected() {
    let base = MeshConfig::default();
    let cases = [
        (
            MeshConfig {
                distance_per_step: 0.0,
                ..base.clone()
            },
            GeneratorError::NonPositive {
                field: "distance_per_step",
                value: 0.0,
            },
        ),
        (
            MeshConfig {
                start_diameter: -1.0,
                ..base.clone()
            },
            GeneratorError::NonPositive {
                field: "start_diameter",
                value: -1.0,
            },
        ),
        (
            MeshConfig {
                end_diameter: f32::INFINITY,
                ..base.clone()
            },
            GeneratorError::NonFinite {
                field: "end_diameter",
            },
        ),
        (
            MeshConfig {
                angle_per_step: 360.0,
                ..base.clone()
            },
            GeneratorError::AngleOutOfRange { value: 360.0 },
        ),
        (
            MeshConfig {
                angle_per_step: -400.0,
                ..base.clone()
            },
            GeneratorError::AngleOutOfRange { value: -400.0 },
        ),
        (
            MeshConfig {
                angle_per_step: 0.0,
                ..base.clone()
            },
            GeneratorError::ZeroAngle,
        ),
        (
            MeshConfig {
                iterations: 0,
                ..base.clone()
            },
            GeneratorError::IterationsOutOfRange {
                value: 0,
                max: MAX_ITERATIONS,
            },
        ),
        (
            MeshConfig {
                iterations: MAX_ITERATIONS + 1,
                ..base.clone()
            },
            GeneratorError::IterationsOutOfRange {
                value: MAX_ITERATIONS + 1,
                max: MAX_ITERATIONS,
            },
        ),
    ];

    for (config, expected) in cases {
        assert_eq!(config.validate(), Err(expected.clone()));
        assert!(expected.is_configuration());

        let interpreter = MeshInterpreter::new(config);
        assert_eq!(interpreter.generate(&bush()), Err(expected.clone()));
        assert_eq!(interpreter.build_mesh("F"), Err(expected));
    }
}

#[test]
fn test_angle_just_inside_range_is_valid() {
    let config = MeshConfig {
        angle_per_step: -359.999,
        ..Default::default()
    };
    assert_eq!(config.validate(), Ok(()));
}

#[test]
fn test_expensive_settings_are_flagged() {
    for config in [
        MeshConfig {
            iterations: 6,
            ..Default::default()
        },
        MeshConfig {
            distance_per_step: 5.5,
            ..Default::default()
        },
        MeshConfig {
            end_diameter: 4.5,
            ..Default::default()
        },
    ] {
        assert!(config.is_expensive(), "{config:?}");
    }
}

#[test]
fn test_partial_config_uses_defaults() {
    let config: MeshConfig =
        serde_json::from_str(r#"{ "iterations": 3, "angle_per_step": 22.5 }"#).unwrap();
    assert_eq!(config.iterations, 3);
    assert_eq!(config.angle_per_step, 22.5);
    assert_eq!(config.distance_per_step, 1.0);
    assert_eq!(config.end_diameter, 1.0);
}

#[test]
fn test_generate_single_step_scenario() {
    let interpreter = MeshInterpreter::new(MeshConfig {
        iterations: 1,
        distance_per_step: 2.0,
        angle_per_step: 45.0,
        start_diameter: 1.0,
        end_diameter: 1.0,
    });
    let mesh = interpreter
        .generate(&LSystem::new("F", RuleTable::new()))
        .unwrap();

    assert_eq!(mesh.vertex_count(), 12);
    assert_eq!(mesh.triangle_count(), 22);

    let bounds = mesh.bounds().unwrap();
    let side = 0.5f32.sqrt();
    assert!(Vec3::from(bounds.min).abs_diff_eq(Vec3::ZERO, 1e-5));
    assert!(Vec3::from(bounds.max).abs_diff_eq(Vec3::new(side, 3.0, side), 1e-5));
}

#[test]
fn test_generate_bushy_grammar() {
    let interpreter = MeshInterpreter::new(MeshConfig {
        iterations: 3,
        end_diameter: 0.4,
        ..Default::default()
    });
    let lsystem = bush();
    let mesh = interpreter.generate(&lsystem).unwrap();

    let expanded = lsystem.expand(3);
    let steps = expanded.chars().filter(|c| *c == 'F').count();
    let branches = expanded.chars().filter(|c| *c == '[').count();

    // Start ring, one ring per step, one cap ring per branch plus the trunk.
    assert_eq!(mesh.vertex_count(), 4 * (1 + steps + branches + 1));
    assert_eq!(
        mesh.triangle_count(),
        2 + 8 * steps + 12 * (branches + 1)
    );

    let count = mesh.vertex_count() as u32;
    assert!(mesh.flat_indices().iter().all(|&i| i < count));
    assert_eq!(mesh.flat_indices().len(), mesh.triangle_count() * 3);
}

#[test]
fn test_post_processor_runs_once() {
    let interpreter = MeshInterpreter::new(MeshConfig::default());
    let mut calls = 0;
    let mut normals = Vec::new();
    let mut post = |mesh: &mut MeshBuffer| {
        calls += 1;
        normals = mesh.vertex_normals();
    };

    let mesh = interpreter.generate_processed(&bush(), &mut post).unwrap();
    assert_eq!(calls, 1);
    assert_eq!(normals.len(), mesh.vertex_count());
}

#[test]
fn test_post_processor_skipped_on_error() {
    let interpreter = MeshInterpreter::new(MeshConfig::default());
    let mut calls = 0;
    let mut post = |_: &mut MeshBuffer| calls += 1;

    let unbalanced = LSystem::new("F]", RuleTable::new());
    let result = interpreter.generate_processed(&unbalanced, &mut post);
    assert_eq!(result, Err(GeneratorError::UnbalancedBranch { position: 1 }));
    assert_eq!(calls, 0);
}

#[test]
fn test_zero_heading_is_degenerate() {
    let mut ctx = GenerationContext::new();
    ctx.turtle_mut().heading = Vec3::ZERO;

    let err = ctx.direction().unwrap_err();
    assert_eq!(err, GeneratorError::DegenerateHeading { position: 0 });
    assert!(err.is_configuration());
}

#[test]
fn test_rotation_keeps_heading_unit_length() {
    let mut ctx = GenerationContext::new();
    for _ in 0..1000 {
        ctx.turtle_mut().yaw(33.0);
        ctx.turtle_mut().pitch(-71.0);
    }
    assert_relative_eq!(ctx.turtle().heading.length(), 1.0, epsilon = 1e-3);
    assert!(ctx.direction().is_ok());
}

/// Records the strategy calls made by the walk loop without emitting geometry.
#[derive(Default)]
struct Recorder {
    calls: RefCell<Vec<&'static str>>,
}

impl TubeBuilder for Recorder {
    fn extrude(&self, _ctx: &mut GenerationContext) -> Result<(), GeneratorError> {
        self.calls.borrow_mut().push("extrude");
        Ok(())
    }

    fn open_branch(&self, ctx: &mut GenerationContext) -> Result<(), GeneratorError> {
        self.calls.borrow_mut().push("open");
        ctx.push_branch(lsystem_tube::BranchFrame {
            heading: ctx.turtle().heading,
            vertex_count: 4,
            ring: [Vec3::ZERO; 4],
        });
        Ok(())
    }

    fn cap(&self, _ctx: &mut GenerationContext) -> Result<(), GeneratorError> {
        self.calls.borrow_mut().push("cap");
        Ok(())
    }
}

#[test]
fn test_walk_loop_dispatches_to_strategy() {
    let interpreter = MeshInterpreter::new(MeshConfig::default());
    let recorder = Recorder::default();

    let ctx = interpreter.interpret("F[<fX]+", &recorder).unwrap();
    assert_eq!(*recorder.calls.borrow(), ["extrude", "open", "extrude", "cap"]);
    assert_eq!(ctx.branch_depth(), 0);
    assert!(ctx.active_frame().is_some());
}

#[test]
fn test_unbalanced_close_emits_nothing() {
    let interpreter = MeshInterpreter::new(MeshConfig::default());
    let recorder = Recorder::default();

    let result = interpreter.interpret("X]", &recorder);
    assert!(matches!(
        result,
        Err(GeneratorError::UnbalancedBranch { position: 1 })
    ));
    assert!(recorder.calls.borrow().is_empty());
}
