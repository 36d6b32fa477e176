//! Thread-Safe Telephone Call
//!
//! The phone call machine moved onto a worker thread. The handset and the
//! volume knob fire triggers from their own threads; the worker applies them
//! one at a time in arrival order.
//!
//! Key concepts:
//! - Configure first, then spawn: the worker is the only writer
//! - `fire` only queues; `current_state` may lag behind
//! - `shutdown` drains the queue and hands the engine back
//!
//! Run with: cargo run --example threaded_phone_call
//! Set `STATECRAFT_QUEUE_CAPACITY` to change the queue bound.

use parking_lot::Mutex;
use statecraft::logging::init_tracing;
use statecraft::{state_enum, trigger_enum, Engine, EngineConfig, FsmError, ThreadSafeEngine};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

state_enum! {
    enum CallState {
        OnHook,
        OffHook,
        Ringing,
        Connected,
    }
}

trigger_enum! {
    enum CallTrigger {
        TakeOffHook,
        CallDialed,
        CallConnected,
        Hangup,
        MuteMicrophone,
        UnmuteMicrophone,
        SetVolume,
    }
}

#[derive(Clone, Debug)]
enum CallData {
    Callee(String),
    Volume(u8),
}

#[derive(Default)]
struct Line {
    callee: Mutex<Option<String>>,
    muted: AtomicBool,
    volume: AtomicU8,
}

fn phone(line: &Arc<Line>, config: EngineConfig) -> Engine<CallState, CallTrigger, CallData> {
    let mut machine = Engine::with_config(
        CallState::OnHook,
        Arc::new(statecraft::TracingSink),
        config,
    );

    machine
        .configure(CallState::OnHook)
        .permit(CallTrigger::TakeOffHook, CallState::OffHook);

    machine
        .configure(CallState::OffHook)
        .permit(CallTrigger::CallDialed, CallState::Ringing)
        .permit(CallTrigger::Hangup, CallState::OnHook);

    let dialed = Arc::clone(line);
    machine
        .configure(CallState::Ringing)
        .on_entry(move |payload, _| match payload {
            Some(CallData::Callee(callee)) => {
                println!("[Phone Call] dialing {callee}");
                *dialed.callee.lock() = Some(callee.clone());
                Ok(())
            }
            _ => Err("dialed without a callee".into()),
        })
        .permit(CallTrigger::CallConnected, CallState::Connected)
        .permit(CallTrigger::Hangup, CallState::OnHook);

    let volume = Arc::clone(line);
    let mute = Arc::clone(line);
    let not_muted = Arc::clone(line);
    let unmute = Arc::clone(line);
    machine
        .configure(CallState::Connected)
        .on_entry(|_, _| {
            println!("[Timer] Call started");
            Ok(())
        })
        .on_exit(|_, _| {
            println!("[Timer] Call ended");
            Ok(())
        })
        .permit_internal(CallTrigger::SetVolume, move |payload, _| {
            if let Some(CallData::Volume(level)) = payload {
                volume.volume.store(*level, Ordering::SeqCst);
                println!("Volume set to {level}!");
            }
            Ok(())
        })
        .permit_internal_if(
            CallTrigger::MuteMicrophone,
            move |_, _| {
                mute.muted.store(true, Ordering::SeqCst);
                println!("Microphone muted!");
                Ok(())
            },
            move || !not_muted.muted.load(Ordering::SeqCst),
        )
        .permit_internal(CallTrigger::UnmuteMicrophone, move |_, _| {
            unmute.muted.store(false, Ordering::SeqCst);
            println!("Microphone unmuted!");
            Ok(())
        })
        .permit(CallTrigger::Hangup, CallState::OnHook);

    machine
}

fn main() -> Result<(), FsmError> {
    init_tracing("statecraft=info");

    println!("=== Thread-Safe Phone Call ===\n");

    let config = EngineConfig::from_env()?.with_worker_name("phone-fsm");
    let line = Arc::new(Line::default());
    let machine = ThreadSafeEngine::spawn(phone(&line, config))?;

    machine.fire(CallTrigger::TakeOffHook)?;
    machine.fire_with(CallTrigger::CallDialed, CallData::Callee("Bob".to_string()))?;
    machine.fire(CallTrigger::CallConnected)?;

    thread::scope(|scope| {
        let handset = scope.spawn(|| -> Result<(), FsmError> {
            for _ in 0..3 {
                machine.fire(CallTrigger::MuteMicrophone)?;
                thread::sleep(Duration::from_millis(5));
                machine.fire(CallTrigger::UnmuteMicrophone)?;
            }
            Ok(())
        });
        let knob = scope.spawn(|| -> Result<(), FsmError> {
            for level in [3, 6, 9] {
                machine.fire_with(CallTrigger::SetVolume, CallData::Volume(level))?;
                thread::sleep(Duration::from_millis(5));
            }
            Ok(())
        });

        for producer in [handset, knob] {
            match producer.join() {
                Ok(result) => result?,
                Err(_) => println!("A producer thread panicked"),
            }
        }
        Ok::<(), FsmError>(())
    })?;

    println!("\nState seen from the caller: {:?}", machine.current_state());
    println!("Triggers still queued: {}", machine.pending());

    machine.fire(CallTrigger::Hangup)?;
    if let Some(engine) = machine.shutdown()? {
        println!("\nFinal state: {:?}", engine.current_state());
        println!("Path: {:?}", engine.history().get_path());
    }

    let stats = machine.stats();
    println!(
        "Worker handled {} triggers: {} transitions, {} internal, {} unhandled, {} failed",
        stats.received, stats.transitioned, stats.internal, stats.unhandled, stats.failed
    );
    println!(
        "Callee {:?}, volume {}, muted {}",
        line.callee.lock().as_deref(),
        line.volume.load(Ordering::SeqCst),
        line.muted.load(Ordering::SeqCst)
    );

    println!("\n=== Example Complete ===");
    Ok(())
}
