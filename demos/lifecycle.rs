//! # Example: lifecycle
//!
//! A miniature host: the "OS" delivers an activity, application code loads a
//! texture through the resource manager, the control loop plays a sound and
//! reports lifecycle events. The second request crashes the loop; with
//! `RestartPolicy::OnFailure` the supervisor logs the failure with a stack dump
//! and relaunches.
//!
//! ## Flow
//! ```text
//! host ──deliver(activity)──► control loop ──"created"──► app
//! app ──request("hero.png")─► control loop ──sound────► audio thread
//! app ──request("boom")─────► control loop ──panic──► supervisor
//!                                                      ├─► log record + stack
//!                                                      ├─► BackoffScheduled
//!                                                      └─► attempt 2
//! ```
//!
//! ## Run
//! ```bash
//! HOSTLOOP_VERBOSE=1 cargo run --example lifecycle
//! ```

use std::sync::Arc;
use std::time::Duration;

use hostloop::{
    ActivityHandle, BackoffPolicy, Config, Input, LogWriter, LoopError, LoopFn, LoopInputs,
    LoopState, Protocol, RestartPolicy, Runtime, SoundReceiver, Subscribe, Supervisor,
};

struct Game;

impl Protocol for Game {
    type Request = String;
    type Event = String;
    type Sound = &'static str;
}

fn control_loop(inputs: LoopInputs<Game>) -> Result<(), LoopError> {
    let log = inputs.logger();
    hostloop::logf!(log, "control loop attempt {} up", inputs.attempt());

    loop {
        match inputs.next()? {
            Input::Activity(h) => {
                hostloop::debugf!(log, "activity {:#x}", h.into_raw());
                inputs
                    .events
                    .send(format!("created {:#x}", h.into_raw()))
                    .map_err(|_| LoopError::Disconnected)?;
            }
            Input::Request(name) if name == "boom" => {
                inputs.failures.report("asset table left half-written");
                panic!("texture loader crashed on {name:?}");
            }
            Input::Request(name) if name == "quit" => return Ok(()),
            Input::Request(name) => {
                inputs.sound.send("click").map_err(|_| LoopError::Disconnected)?;
                inputs
                    .events
                    .send(format!("loaded {name}"))
                    .map_err(|_| LoopError::Disconnected)?;
            }
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    hostloop::init_tracing();

    let cfg = Config {
        restart: RestartPolicy::OnFailure,
        backoff: BackoffPolicy::constant(Duration::from_millis(200)),
        ..Config::from_env()
    };
    let rt = Runtime::<Game>::init(cfg);

    let _audio = rt.spawn_audio(|sounds: SoundReceiver<&'static str>| {
        for s in sounds.iter() {
            println!("[audio] {s}");
        }
    })?;

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let handle = Supervisor::builder(rt.clone())
        .with_subscribers(subs)
        .build()
        .spawn(LoopFn::arc("game", control_loop));

    // Host and application run on their own threads; the async side only supervises.
    let app = {
        let rt = rt.clone();
        std::thread::spawn(move || -> anyhow::Result<()> {
            rt.lifecycle_bridge()
                .deliver(ActivityHandle::from_raw(0x7f00_1000))?;

            let rm = rt.resource_manager();
            let events = rt.events();
            println!("[app] {}", events.recv()?);

            rm.send("hero.png".to_string())?;
            println!("[app] {}", events.recv()?);

            rm.send("boom".to_string())?;
            // Blocks until the relaunched loop takes it.
            rm.send("tiles.png".to_string())?;
            println!("[app] {}", events.recv()?);

            rm.send("quit".to_string())?;
            Ok(())
        })
    };

    let mut state = handle.watch();
    state.wait_for(LoopState::is_final).await?;
    println!("[main] supervisor finished in state {:?}", handle.state());

    handle.join().await?;
    app.join()
        .map_err(|_| anyhow::anyhow!("app thread panicked"))??;
    Ok(())
}
