use machina::{Command, CompileOptions, CursorChain, RobotBrand, RobotConfig};

const PROGRAM: &str = r#"[
    {"command": "TransformTo", "args": [300, 0, 500, 0, 1, 0, 90]},
    {"command": "SpeedTo", "args": [50]},
    {"command": "PushSettings"},
    {"command": "SpeedTo", "args": [10]},
    {"command": "Move", "args": [0, 0, -20]},
    {"command": "PopSettings"},
    {"command": "WriteDigital", "args": ["1", true]},
    {"command": "Wait", "args": [1000]},
    {"command": "Message", "args": ["done"]}
]"#;

#[test]
fn test_json_commands_drive_a_chain() {
    let commands: Vec<Command> = serde_json::from_str(PROGRAM).unwrap();
    let actions = commands
        .iter()
        .map(Command::to_action)
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

    let mut chain = CursorChain::from_config(RobotConfig::new("Pick", RobotBrand::Human)).unwrap();
    assert_eq!(chain.issue_all(actions).unwrap(), 9);
    assert!((chain.issue_cursor().speed() - 50.0).abs() < 1e-9);

    let program = chain.compile_program(&CompileOptions::default()).unwrap();
    let instructions: Vec<&str> = program
        .lines()
        .skip(1)
        .filter_map(|line| line.split(" //").next())
        .collect();
    assert_eq!(
        instructions,
        vec![
            "TransformTo(300,0,500,0,1,0,90);",
            "SpeedTo(50);",
            "PushSettings();",
            "SpeedTo(10);",
            "Move(0,0,-20);",
            "PopSettings();",
            "WriteDigital(\"1\",true,false);",
            "Wait(1000);",
            "Message(\"done\");",
        ]
    );
}

#[test]
fn test_invalid_commands_are_reported() {
    let err = Command::from_json(r#"{"command": "MoveTo", "args": [1, 2]}"#)
        .unwrap()
        .to_action()
        .unwrap_err();
    assert!(err.to_string().contains("MoveTo: expected 3 arguments, got 2"), "{}", err);

    assert!(Command::from_json("{\"args\": []}").is_err());
}
