#![deny(
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces,
    unused_qualifications,
    clippy::unwrap_used
)]

/*!
Robot-agnostic motion middleware.

Client code issues device-independent [`ActionKind`]s to a [`CursorChain`].
Each action is validated against a simulated robot state, buffered, and
later replayed by a [`Compiler`] into an offline program for a specific
brand (ABB RAPID, URScript, KUKA KRL, ZMorph G-code, or Machina's own
instruction syntax), or by an [`ActionEncoder`] into per-action messages
for a live controller.

The chain holds three cursors:

- **issue**: applies every action as it is issued and rejects the ones
  that cannot be applied (e.g. a relative move before the pose is known).
- **release**: receives released actions; compilers and encoders replay it.
- **execution**: follows what the controller reports as executed.

## Example

```rust
use machina::{ActionKind, CompileOptions, CursorChain, InitialPose, RobotBrand, RobotConfig, Rotation, Vector};

let home = InitialPose::cartesian(Vector::new(300.0, 0.0, 600.0), Rotation::identity());
let config = RobotConfig::new("Demo", RobotBrand::Abb).with_initial_pose(home);
let mut chain = CursorChain::from_config(config).unwrap();

chain.issue(ActionKind::Speed { value: 100.0, relative: false }).unwrap();
chain
    .issue(ActionKind::Translation {
        translation: Vector::new(300.0, 0.0, 500.0),
        relative: false,
    })
    .unwrap();

let program = chain.compile_program(&CompileOptions::default()).unwrap();
assert!(program.lines().any(|line| line.trim_start().starts_with("MoveL [[300,0,500]")));
```

Actions can also be built from structured commands, using the same names
the human-readable compiler prints:

```rust
use machina::Command;

let command = Command::from_json(r#"{"command": "SpeedTo", "args": [100]}"#).unwrap();
assert_eq!(command.to_action().unwrap().to_instruction(), "SpeedTo(100);");
```
*/

pub mod action;
pub mod action_buffer;
pub mod chain;
pub mod command;
pub mod compiler;
pub mod config;
pub mod cursor;
pub mod error;
pub mod format;
pub mod logging;
pub mod program;
pub mod settings;
pub mod stream;
pub mod tool;
pub mod types;

pub use action::{Action, ActionKind, ActionType};
pub use action_buffer::ActionBuffer;
pub use chain::CursorChain;
pub use command::{Command, CommandRegistry};
pub use compiler::{AbbCompiler, Compiler, HumanCompiler, KukaCompiler, RobotBrand, UrCompiler, ZmorphCompiler};
pub use config::{CompileOptions, RobotConfig};
pub use cursor::{PoseState, RobotCursor};
pub use error::{MachinaError, Result};
pub use logging::{LogEntry, LogLevel, RobotLogger};
pub use program::{Encoding, Program, RobotProgramFile};
pub use settings::{Settings, SettingsBuffer};
pub use stream::{ActionEncoder, ActionFrame, BridgeEncoder, FrameEncoder, decode_frame};
pub use tool::Tool;
pub use types::{ExternalAxesTarget, InitialPose, MotionType, ReferenceCS, RobotPartType};

/// Geometry value types, re-exported for convenience.
pub use machina_geometry::{AxisAngle, Joints, Plane, Rotation, RotationVector, Vector, YawPitchRoll};

/// Re-export so listeners can name the log channel types.
pub use async_channel;
