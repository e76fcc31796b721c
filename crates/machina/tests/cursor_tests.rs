use machina::{
    ActionKind, CursorChain, InitialPose, LogLevel, MachinaError, PoseState, ReferenceCS, RobotBrand, RobotConfig,
    RobotLogger, Rotation, Tool, Vector,
};

const TOLERANCE: f64 = 1e-6;

// Helper: a chain whose cursors start at `position` with identity orientation
fn chain_at(position: Vector) -> CursorChain {
    let config = RobotConfig::new("robot", RobotBrand::Human)
        .with_initial_pose(InitialPose::cartesian(position, Rotation::identity()));
    CursorChain::from_config(config).unwrap()
}

fn chain_with_rotation(rotation: Rotation) -> CursorChain {
    let config = RobotConfig::new("robot", RobotBrand::Human)
        .with_initial_pose(InitialPose::cartesian(Vector::zero(), rotation));
    CursorChain::from_config(config).unwrap()
}

fn move_by(x: f64, y: f64, z: f64) -> ActionKind {
    ActionKind::Translation {
        translation: Vector::new(x, y, z),
        relative: true,
    }
}

fn speed_to(value: f64) -> ActionKind {
    ActionKind::Speed { value, relative: false }
}

fn assert_position(chain: &CursorChain, expected: Vector) {
    let position = chain.issue_cursor().position().unwrap();
    assert!(
        position.is_similar(&expected, TOLERANCE),
        "expected position {}, got {}",
        expected,
        position
    );
}

#[test]
fn test_world_translations_accumulate() {
    let mut chain = chain_at(Vector::zero());

    assert!(chain.issue(move_by(10.0, 0.0, 0.0)).unwrap());
    assert!(chain.issue(move_by(0.0, 20.0, 0.0)).unwrap());
    assert!(chain.issue(move_by(0.0, 0.0, -5.0)).unwrap());

    assert_position(&chain, Vector::new(10.0, 20.0, -5.0));
    let rotation = chain.issue_cursor().rotation().unwrap();
    assert!(rotation.is_similar(&Rotation::identity(), TOLERANCE));
}

#[test]
fn test_relative_motion_before_pose_is_rejected() {
    let mut chain = CursorChain::from_config(RobotConfig::default()).unwrap();
    assert_eq!(chain.issue_cursor().pose(), PoseState::Unknown);

    assert!(!chain.issue(move_by(10.0, 0.0, 0.0)).unwrap());
    assert_eq!(chain.issue_cursor().pending_len(), 0);
    assert_eq!(chain.next_id(), 1);

    // Absolute translation also needs a known orientation
    let move_to = ActionKind::Translation {
        translation: Vector::new(100.0, 0.0, 0.0),
        relative: false,
    };
    assert!(!chain.issue(move_to).unwrap());

    let transform_to = ActionKind::Transformation {
        translation: Vector::new(100.0, 0.0, 0.0),
        rotation: Rotation::identity(),
        relative: false,
        translation_first: true,
    };
    assert!(chain.issue(transform_to).unwrap());
    assert!(chain.issue(move_by(10.0, 0.0, 0.0)).unwrap());
    assert_position(&chain, Vector::new(110.0, 0.0, 0.0));
}

#[test]
fn test_rejected_actions_do_not_consume_ids() {
    let mut chain = CursorChain::from_config(RobotConfig::default()).unwrap();

    assert!(chain.issue(speed_to(50.0)).unwrap());
    assert!(!chain.issue(move_by(1.0, 0.0, 0.0)).unwrap());
    assert!(chain.issue(speed_to(60.0)).unwrap());

    let ids: Vec<i64> = chain
        .issue_cursor()
        .pending_actions()
        .iter()
        .map(|action| action.id())
        .collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(chain.next_id(), 3);
}

#[test]
fn test_rejection_is_logged() {
    let (logger, receiver) = RobotLogger::channel("arm");
    let mut chain = CursorChain::new(RobotConfig::new("arm", RobotBrand::Abb), logger).unwrap();

    assert!(!chain.issue(move_by(1.0, 0.0, 0.0)).unwrap());

    let entries: Vec<_> = std::iter::from_fn(|| receiver.try_recv().ok()).collect();
    let rejection = entries
        .iter()
        .find(|entry| entry.message.starts_with("Could not issue"))
        .expect("rejection entry");
    assert_eq!(rejection.level, LogLevel::Warning);
    assert_eq!(rejection.source, "arm/issue");
    assert!(rejection.message.contains("Move [1, 0, 0] mm"), "{}", rejection.message);
}

#[test]
fn test_push_pop_restores_settings() {
    let mut chain = chain_at(Vector::zero());

    chain.issue(speed_to(100.0)).unwrap();
    chain.issue(ActionKind::PushSettings).unwrap();
    chain.issue(speed_to(10.0)).unwrap();
    chain
        .issue(ActionKind::Precision {
            value: 1.0,
            relative: false,
        })
        .unwrap();
    chain
        .issue(ActionKind::Coordinates {
            reference_cs: ReferenceCS::Local,
        })
        .unwrap();
    assert!((chain.issue_cursor().speed() - 10.0).abs() < TOLERANCE);

    chain.issue(ActionKind::PopSettings).unwrap();

    let cursor = chain.issue_cursor();
    assert!((cursor.speed() - 100.0).abs() < TOLERANCE);
    assert!((cursor.precision() - 5.0).abs() < TOLERANCE);
    assert_eq!(cursor.reference_cs(), ReferenceCS::World);
    let before = cursor.settings_buffer().settings_before_pop().unwrap();
    assert!((before.speed - 10.0).abs() < TOLERANCE);
}

#[test]
fn test_pop_on_empty_stack_is_accepted() {
    let mut chain = chain_at(Vector::zero());
    chain.issue(speed_to(42.0)).unwrap();
    assert!(chain.issue(ActionKind::PopSettings).unwrap());
    assert!((chain.issue_cursor().speed() - 42.0).abs() < TOLERANCE);
}

#[test]
fn test_33rd_nested_push_overflows() {
    let mut chain = chain_at(Vector::zero());
    for _ in 0..32 {
        assert!(chain.issue(ActionKind::PushSettings).unwrap());
    }

    let result = chain.issue(ActionKind::PushSettings);
    assert!(matches!(result, Err(MachinaError::SettingsBufferOverflow { capacity: 32 })));
}

#[test]
fn test_negative_settings_clamp_to_zero() {
    let mut chain = chain_at(Vector::zero());
    chain
        .issue(ActionKind::Speed {
            value: -500.0,
            relative: true,
        })
        .unwrap();
    assert_eq!(chain.issue_cursor().speed(), 0.0);
}

#[test]
fn test_attach_detach_restores_flange_pose() {
    let start = Vector::new(100.0, 0.0, 500.0);
    let rotation = Rotation::from_axis_angle(Vector::z_axis(), 90.0);
    let config = RobotConfig::default().with_initial_pose(InitialPose::cartesian(start, rotation));
    let mut chain = CursorChain::from_config(config).unwrap();

    let tool = Tool::new(
        "gripper",
        Vector::new(0.0, 0.0, 100.0),
        Rotation::from_axis_angle(Vector::y_axis(), 30.0),
        2.5,
        Vector::new(0.0, 0.0, 50.0),
    )
    .unwrap();
    chain.issue(ActionKind::DefineTool { tool }).unwrap();
    chain
        .issue(ActionKind::AttachTool {
            name: "gripper".to_string(),
        })
        .unwrap();

    assert_position(&chain, Vector::new(100.0, 0.0, 600.0));
    assert_eq!(chain.issue_cursor().tool().map(Tool::name), Some("gripper"));

    chain.issue(ActionKind::DetachTool).unwrap();

    assert_position(&chain, start);
    let restored = chain.issue_cursor().rotation().unwrap();
    assert!(restored.is_similar(&rotation, TOLERANCE), "rotation not restored: {}", restored);
    assert!(chain.issue_cursor().tool().is_none());
}

#[test]
fn test_attaching_undefined_tool_is_rejected() {
    let mut chain = chain_at(Vector::zero());
    let attached = chain
        .issue(ActionKind::AttachTool {
            name: "missing".to_string(),
        })
        .unwrap();
    assert!(!attached);
    assert!(!chain.issue(ActionKind::DetachTool).unwrap());
}

#[test]
fn test_redefining_a_tool_overwrites_it() {
    let (logger, receiver) = RobotLogger::channel("robot");
    let mut chain = CursorChain::new(RobotConfig::default(), logger).unwrap();

    for weight in [1.0, 3.0] {
        let tool = Tool::new("torch", Vector::new(0.0, 0.0, 50.0), Rotation::identity(), weight, Vector::zero())
            .unwrap();
        assert!(chain.issue(ActionKind::DefineTool { tool }).unwrap());
    }

    let tools = chain.issue_cursor().available_tools();
    assert_eq!(tools.len(), 1);
    assert!((tools["torch"].weight - 3.0).abs() < TOLERANCE);

    let overwritten = std::iter::from_fn(|| receiver.try_recv().ok())
        .any(|entry| entry.level == LogLevel::Info && entry.message.contains("already defined"));
    assert!(overwritten);
}

#[test]
fn test_local_transformation_order() {
    let start = Rotation::from_axis_angle(Vector::z_axis(), 90.0);
    let delta = Rotation::from_axis_angle(Vector::z_axis(), 90.0);
    let local = ActionKind::Coordinates {
        reference_cs: ReferenceCS::Local,
    };

    // Translate in the current frame, then rotate
    let mut chain = chain_with_rotation(start);
    chain.issue(local.clone()).unwrap();
    chain
        .issue(ActionKind::Transformation {
            translation: Vector::new(10.0, 0.0, 0.0),
            rotation: delta,
            relative: true,
            translation_first: true,
        })
        .unwrap();
    assert_position(&chain, Vector::new(0.0, 10.0, 0.0));
    let expected = Rotation::from_axis_angle(Vector::z_axis(), 180.0);
    assert!(chain.issue_cursor().rotation().unwrap().is_similar(&expected, TOLERANCE));

    // Rotate first, then translate in the rotated frame
    let mut chain = chain_with_rotation(start);
    chain.issue(local).unwrap();
    chain
        .issue(ActionKind::Transformation {
            translation: Vector::new(10.0, 0.0, 0.0),
            rotation: delta,
            relative: true,
            translation_first: false,
        })
        .unwrap();
    assert_position(&chain, Vector::new(-10.0, 0.0, 0.0));
    assert!(chain.issue_cursor().rotation().unwrap().is_similar(&expected, TOLERANCE));
}

#[test]
fn test_world_transformation_ignores_order_flag() {
    for translation_first in [true, false] {
        let mut chain = chain_with_rotation(Rotation::from_axis_angle(Vector::z_axis(), 90.0));
        chain
            .issue(ActionKind::Transformation {
                translation: Vector::new(10.0, 0.0, 0.0),
                rotation: Rotation::from_axis_angle(Vector::z_axis(), 45.0),
                relative: true,
                translation_first,
            })
            .unwrap();
        assert_position(&chain, Vector::new(10.0, 0.0, 0.0));
    }
}

#[test]
fn test_extrusion_accumulates_along_moves() {
    let mut chain = chain_at(Vector::zero());
    chain
        .issue(ActionKind::ExtrusionRate {
            value: 0.5,
            relative: false,
        })
        .unwrap();

    // Not extruding yet
    chain.issue(move_by(10.0, 0.0, 0.0)).unwrap();
    assert_eq!(chain.issue_cursor().extruded_length(), 0.0);

    chain.issue(ActionKind::Extrusion { on: true }).unwrap();
    chain.issue(move_by(100.0, 0.0, 0.0)).unwrap();
    chain.issue(move_by(0.0, 40.0, 0.0)).unwrap();

    let cursor = chain.issue_cursor();
    assert!((cursor.extruded_length() - 70.0).abs() < TOLERANCE);
    assert!((cursor.prev_extruded_length() - 50.0).abs() < TOLERANCE);
}

#[test]
fn test_release_cursor_lags_until_released() {
    let mut chain = chain_at(Vector::zero());
    chain.issue(move_by(10.0, 0.0, 0.0)).unwrap();
    chain.issue(move_by(10.0, 0.0, 0.0)).unwrap();

    // Initialization has not reached the release cursor either
    assert_eq!(chain.release_cursor().pose(), PoseState::Unknown);

    let released = chain.release_next().unwrap().unwrap();
    assert_eq!(released.id(), 1);
    assert_eq!(chain.release_cursor().pending_len(), 1);
    assert_eq!(chain.issue_cursor().pending_len(), 2);

    assert_eq!(chain.release_all().unwrap(), 2);
    assert_eq!(chain.release_cursor().pending_len(), 3);
}

#[test]
fn test_execute_up_to_applies_in_order() {
    let mut chain = chain_at(Vector::zero());
    for _ in 0..4 {
        chain.issue(move_by(10.0, 0.0, 0.0)).unwrap();
    }
    chain.release_all().unwrap();

    // Release cursor replays the actions and cascades into execution
    while chain.release_cursor_mut().apply_next_action().unwrap().is_some() {}
    assert_eq!(chain.execution_cursor().pending_len(), 5);

    assert_eq!(chain.execute_up_to(3).unwrap(), 3);
    let executed: Vec<i64> = chain
        .execution_cursor()
        .released_actions()
        .iter()
        .map(|action| action.id())
        .collect();
    assert_eq!(executed, vec![1, 2, 3]);
    let position = chain.execution_cursor().position().unwrap();
    assert!(position.is_similar(&Vector::new(20.0, 0.0, 0.0), TOLERANCE));

    let missing = chain.execute_up_to(42);
    assert!(matches!(missing, Err(MachinaError::ActionIdNotFound { id: 42 })));
    assert_eq!(chain.execution_cursor().pending_len(), 2);
}

#[test]
fn test_flush_discards_pending_everywhere() {
    let mut chain = chain_at(Vector::zero());
    chain.issue(speed_to(10.0)).unwrap();
    chain.set_block().unwrap();
    chain.issue(speed_to(20.0)).unwrap();

    assert_eq!(chain.flush(), 3);
    assert_eq!(chain.issue_cursor().pending_len(), 0);
    assert_eq!(chain.release_cursor().pending_len(), 0);

    // The issue cursor keeps its state; ids keep counting
    assert!((chain.issue_cursor().speed() - 20.0).abs() < TOLERANCE);
    assert!(chain.issue(speed_to(30.0)).unwrap());
    assert_eq!(chain.issue_cursor().pending_actions()[0].id(), 4);
}

#[test]
fn test_external_axes_and_arm_angle_need_absolute_first() {
    let mut chain = chain_at(Vector::zero());

    let increase_axis = ActionKind::ExternalAxis {
        axis_number: 1,
        value: 10.0,
        target: machina::ExternalAxesTarget::All,
        relative: true,
    };
    assert!(!chain.issue(increase_axis.clone()).unwrap());
    assert!(
        !chain
            .issue(ActionKind::ArmAngle {
                value: 5.0,
                relative: true
            })
            .unwrap()
    );

    chain
        .issue(ActionKind::ExternalAxis {
            axis_number: 1,
            value: 100.0,
            target: machina::ExternalAxesTarget::All,
            relative: false,
        })
        .unwrap();
    assert!(chain.issue(increase_axis).unwrap());
    assert_eq!(chain.issue_cursor().external_axes_cartesian()[0], Some(110.0));
    assert_eq!(chain.issue_cursor().external_axes_joint()[0], Some(110.0));
}

#[test]
fn test_io_and_temperature_state() {
    let mut chain = chain_at(Vector::zero());
    chain
        .issue(ActionKind::IODigital {
            pin_id: "3".to_string(),
            on: true,
            tool_pin: false,
        })
        .unwrap();
    chain
        .issue(ActionKind::Temperature {
            value: 200.0,
            part: machina::RobotPartType::Extruder,
            wait: false,
            relative: false,
        })
        .unwrap();
    chain
        .issue(ActionKind::Temperature {
            value: 15.0,
            part: machina::RobotPartType::Extruder,
            wait: true,
            relative: true,
        })
        .unwrap();

    let cursor = chain.issue_cursor();
    assert_eq!(cursor.digital_output("3", false), Some(true));
    assert_eq!(cursor.digital_output("3", true), None);
    assert!((cursor.temperature(machina::RobotPartType::Extruder) - 215.0).abs() < TOLERANCE);
    assert_eq!(cursor.temperature(machina::RobotPartType::Bed), 0.0);
}
