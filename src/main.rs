//! Table Sim headless runner
//!
//! Plays a level natively with a simple autopilot and prints the final
//! snapshot as JSON.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;
    use std::process::ExitCode;

    use clap::Parser;
    use table_sim::Tuning;
    use table_sim::consts::SIM_DT;
    use table_sim::sim::{LevelSet, Session, Side, Snapshot};

    /// Frame delta fed to the session, like a 60 Hz display
    const FRAME_DT: f64 = 1.0 / 60.0;

    #[derive(Parser, Debug)]
    #[command(name = "table-sim")]
    #[command(about = "Play a table level headlessly and print the final snapshot as JSON")]
    pub struct Args {
        /// Levels JSON file (built-in levels when omitted)
        pub levels: Option<PathBuf>,

        /// Level to play; out-of-range indices wrap
        #[arg(default_value_t = 0)]
        pub level_index: u32,

        /// Simulated seconds to play before stopping
        #[arg(default_value_t = 60.0, value_parser = parse_seconds)]
        pub seconds: f64,
    }

    fn parse_seconds(s: &str) -> Result<f64, String> {
        let value: f64 = s.parse().map_err(|_| format!("`{s}` is not a number"))?;
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(format!("`{s}` must be a positive number of seconds"))
        }
    }

    fn load_levels(path: Option<&PathBuf>) -> Result<LevelSet, String> {
        let Some(path) = path else {
            return Ok(LevelSet::builtin());
        };
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("{}: {}", path.display(), e))?;
        LevelSet::from_json(&json).map_err(|e| format!("{}: {}", path.display(), e))
    }

    /// Flipper buttons to hold: a side is pressed while a falling body is
    /// within reach of its pivot
    pub fn flipper_presses(snapshot: &Snapshot) -> [(Side, bool); 2] {
        let mut pressed = [(Side::Left, false), (Side::Right, false)];
        for view in &snapshot.flippers {
            let reach = (view.tip - view.pivot).length();
            let near = snapshot.bodies.iter().any(|b| {
                b.active
                    && b.vel.y > 0.0
                    && b.pos.y > view.pivot.y - reach
                    && b.pos.distance(view.pivot) < reach + b.radius
            });
            for slot in pressed.iter_mut().filter(|(side, _)| *side == view.side) {
                slot.1 = near;
            }
        }
        pressed
    }

    /// Launch when idle, otherwise work the flippers
    pub fn autopilot(session: &mut Session) {
        let snapshot = session.snapshot();
        if snapshot.status.is_terminal() {
            return;
        }
        if snapshot.bodies.iter().all(|b| !b.active) {
            session.launch();
            return;
        }
        for (side, down) in flipper_presses(snapshot) {
            session.set_flipper(side, down);
        }
    }

    fn report(snapshot: &Snapshot, elapsed: f64) {
        log::info!(
            "Finished after {:.1}s: {:?}, score {}, lives {}, targets {}/{}",
            elapsed,
            snapshot.status,
            snapshot.score,
            snapshot.lives,
            snapshot.targets.iter().filter(|t| t.hit).count(),
            snapshot.targets.len()
        );
    }

    pub fn run() -> ExitCode {
        env_logger::init();
        let args = Args::parse();

        let levels = match load_levels(args.levels.as_ref()) {
            Ok(levels) => levels,
            Err(msg) => {
                log::error!("Could not load levels: {}", msg);
                return ExitCode::FAILURE;
            }
        };

        let mut session = Session::new(levels, Tuning::default());
        session.start(args.level_index);

        let mut elapsed = 0.0;
        let mut last_status = session.status();
        while elapsed < args.seconds && !session.status().is_terminal() {
            autopilot(&mut session);
            session.update(FRAME_DT);
            elapsed += FRAME_DT;

            let status = session.status();
            if status != last_status {
                log::info!("{:?} -> {:?} at {:.2}s", last_status, status, elapsed);
                last_status = status;
            }
            for event in &session.snapshot().events {
                log::debug!("{:?}", event);
            }
        }

        let snapshot = session.snapshot();
        report(snapshot, elapsed);
        log::debug!(
            "Simulated {} ticks of {:.5}s",
            session.state().time_ticks,
            SIM_DT
        );
        println!("{}", snapshot.to_json());
        ExitCode::SUCCESS
    }

}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    native::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The browser entry point is `table_sim::web::WebTable`
}
