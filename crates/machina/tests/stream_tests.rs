use machina::{
    ActionEncoder, ActionKind, BridgeEncoder, CursorChain, FrameEncoder, InitialPose, Joints, MachinaError,
    RobotConfig, Rotation, Vector, decode_frame,
};

const TOLERANCE: f64 = 1e-9;

fn released_chain(actions: Vec<ActionKind>) -> CursorChain {
    let config = RobotConfig::default()
        .with_initial_pose(InitialPose::cartesian(Vector::new(0.0, 0.0, 500.0), Rotation::identity()));
    let mut chain = CursorChain::from_config(config).unwrap();
    chain.issue_all(actions).unwrap();
    chain.release_all().unwrap();
    chain
}

#[test]
fn test_bridge_messages() {
    let mut chain = released_chain(vec![
        ActionKind::Speed {
            value: 100.0,
            relative: false,
        },
        ActionKind::Translation {
            translation: Vector::new(10.0, 0.0, 0.0),
            relative: true,
        },
    ]);

    let mut encoder = BridgeEncoder;
    let messages = encoder.encode_all(chain.release_cursor_mut()).unwrap();
    let text: Vec<String> = messages
        .into_iter()
        .map(|bytes| String::from_utf8(bytes).unwrap())
        .collect();

    assert_eq!(text.len(), 3);
    assert!(text[0].starts_with("@1 // Initialized with"));
    assert_eq!(text[1], "@2 SpeedTo(100);\n");
    assert_eq!(text[2], "@3 Move(10,0,0);\n");

    // Drained
    assert!(encoder.encode_next(chain.release_cursor_mut()).unwrap().is_none());
}

#[test]
fn test_frames_carry_resulting_pose() {
    let mut chain = released_chain(vec![ActionKind::Translation {
        translation: Vector::new(0.0, 0.0, -100.0),
        relative: true,
    }]);

    let mut encoder = FrameEncoder;
    let frames = encoder.encode_all(chain.release_cursor_mut()).unwrap();
    assert_eq!(frames.len(), 2);

    let bytes = &frames[1];
    let declared = u64::from_le_bytes(bytes[..8].try_into().unwrap()) as usize;
    assert_eq!(declared, bytes.len() - 8);

    let frame = decode_frame(bytes).unwrap();
    assert_eq!(frame.id, 2);
    assert_eq!(frame.action.id(), 2);
    assert!(matches!(frame.action.kind(), ActionKind::Translation { relative: true, .. }));
    let position = frame.position.unwrap();
    assert!(position.is_similar(&Vector::new(0.0, 0.0, 400.0), TOLERANCE));
    assert!(frame.rotation.is_some());
    assert!(frame.axes.is_none());
}

#[test]
fn test_joint_frame() {
    let mut chain = released_chain(vec![ActionKind::Axes {
        joints: Joints::new(0.0, -90.0, 90.0, 0.0, 90.0, 0.0),
        relative: false,
    }]);
    let frames = FrameEncoder.encode_all(chain.release_cursor_mut()).unwrap();

    let frame = decode_frame(&frames[1]).unwrap();
    assert!(frame.position.is_none());
    let axes = frame.axes.unwrap();
    assert!((axes[1] + 90.0).abs() < TOLERANCE);
}

#[test]
fn test_corrupt_frame_is_an_encoding_error() {
    let mut chain = released_chain(vec![ActionKind::Wait { millis: 250 }]);
    let frames = FrameEncoder.encode_all(chain.release_cursor_mut()).unwrap();

    let mut truncated = frames[1].clone();
    truncated.truncate(truncated.len() - 1);
    assert!(matches!(decode_frame(&truncated), Err(MachinaError::Encoding(_))));
    assert!(matches!(decode_frame(&[]), Err(MachinaError::Encoding(_))));
}
