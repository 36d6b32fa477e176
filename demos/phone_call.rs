//! Telephone Call State Machine
//!
//! A phone call modelled with the synchronous engine.
//!
//! Key concepts:
//! - Payloads delivered to entry hooks (the dialed callee)
//! - Internal transitions (volume, mute) that keep the call connected
//! - A guard that refuses to mute twice
//! - Entry/exit hooks starting and stopping the call timer
//!
//! Run with: cargo run --example phone_call
//! Set `RUST_LOG=statecraft=debug` to see every trigger the engine handles.

use chrono::Local;
use parking_lot::Mutex;
use statecraft::logging::init_tracing;
use statecraft::{state_enum, trigger_enum, Engine, FsmError};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

state_enum! {
    enum CallState {
        OnHook,
        OffHook,
        Ringing,
        Connected,
        OnHold,
        PhoneDestroyed,
    }
    final: [PhoneDestroyed]
}

trigger_enum! {
    enum CallTrigger {
        CallDialed,
        TakeOffHook,
        CallConnected,
        PlacedOnHold,
        TakenOffHold,
        Hangup,
        PhoneHurledAgainstWall,
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

struct Line {
    caller: String,
    callee: Mutex<Option<String>>,
    muted: AtomicBool,
    volume: AtomicU8,
}

struct PhoneCall {
    line: Arc<Line>,
    machine: Engine<CallState, CallTrigger, CallData>,
}

impl PhoneCall {
    fn new(caller: &str) -> Self {
        let line = Arc::new(Line {
            caller: caller.to_string(),
            callee: Mutex::new(None),
            muted: AtomicBool::new(false),
            volume: AtomicU8::new(5),
        });
        let mut machine: Engine<CallState, CallTrigger, CallData> =
            Engine::new(CallState::OnHook);

        machine
            .configure(CallState::OnHook)
            .permit(CallTrigger::TakeOffHook, CallState::OffHook);

        machine
            .configure(CallState::OffHook)
            .permit(CallTrigger::CallDialed, CallState::Ringing)
            .permit(CallTrigger::Hangup, CallState::OnHook);

        let dialed = Arc::clone(&line);
        machine
            .configure(CallState::Ringing)
            .on_entry(move |payload, _| {
                if let Some(CallData::Callee(callee)) = payload {
                    println!("[Phone Call] placed from {} to {}", dialed.caller, callee);
                    *dialed.callee.lock() = Some(callee.clone());
                }
                Ok(())
            })
            .permit(CallTrigger::CallConnected, CallState::Connected)
            .permit(CallTrigger::Hangup, CallState::OnHook);

        let volume = Arc::clone(&line);
        let mute = Arc::clone(&line);
        let not_muted = Arc::clone(&line);
        let unmute = Arc::clone(&line);
        machine
            .configure(CallState::Connected)
            .on_entry(|_, _| {
                println!("[Timer] Call started at {}", Local::now().format("%H:%M:%S"));
                Ok(())
            })
            .on_exit(|_, _| {
                println!("[Timer] Call ended at {}", Local::now().format("%H:%M:%S"));
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
            .permit(CallTrigger::PlacedOnHold, CallState::OnHold)
            .permit(CallTrigger::Hangup, CallState::OnHook);

        machine
            .configure(CallState::OnHold)
            .permit(CallTrigger::TakenOffHold, CallState::Connected)
            .permit(CallTrigger::Hangup, CallState::OnHook)
            .permit(CallTrigger::PhoneHurledAgainstWall, CallState::PhoneDestroyed);

        machine.configure(CallState::PhoneDestroyed);

        Self { line, machine }
    }

    fn take_off_hook(&mut self) -> Result<bool, FsmError> {
        self.machine.fire(CallTrigger::TakeOffHook)
    }

    fn dial(&mut self, callee: &str) -> Result<bool, FsmError> {
        self.machine
            .fire_with(CallTrigger::CallDialed, CallData::Callee(callee.to_string()))
    }

    fn connected(&mut self) -> Result<bool, FsmError> {
        self.machine.fire(CallTrigger::CallConnected)
    }

    fn set_volume(&mut self, level: u8) -> Result<bool, FsmError> {
        self.machine
            .fire_with(CallTrigger::SetVolume, CallData::Volume(level))
    }

    fn mute(&mut self) -> Result<bool, FsmError> {
        self.machine.fire(CallTrigger::MuteMicrophone)
    }

    fn unmute(&mut self) -> Result<bool, FsmError> {
        self.machine.fire(CallTrigger::UnmuteMicrophone)
    }

    fn hold(&mut self) -> Result<bool, FsmError> {
        self.machine.fire(CallTrigger::PlacedOnHold)
    }

    fn resume(&mut self) -> Result<bool, FsmError> {
        self.machine.fire(CallTrigger::TakenOffHold)
    }

    fn hang_up(&mut self) -> Result<bool, FsmError> {
        self.machine.fire(CallTrigger::Hangup)
    }

    fn print(&self) {
        println!(
            "[{}] call to {:?}, status {:?}, volume {}, muted {}",
            self.line.caller,
            self.line.callee.lock().as_deref().unwrap_or("nobody"),
            self.machine.current_state(),
            self.line.volume.load(Ordering::SeqCst),
            self.line.muted.load(Ordering::SeqCst),
        );
    }
}

fn main() -> Result<(), FsmError> {
    init_tracing("statecraft=info");

    println!("=== Phone Call State Machine ===\n");

    let mut call = PhoneCall::new("Alice");
    call.print();

    call.take_off_hook()?;
    call.dial("Bob")?;
    call.connected()?;
    call.print();

    call.set_volume(2)?;
    call.print();

    println!("\nMute handled: {}", call.mute()?);
    println!("Mute again handled: {}", call.mute()?);
    println!("Unmute handled: {}", call.unmute()?);
    call.set_volume(11)?;
    call.print();

    call.hold()?;
    call.print();
    call.resume()?;

    call.hang_up()?;
    call.print();

    println!("\nTransitions taken:");
    for step in call.machine.history().transitions() {
        println!("  {:?} -> {:?} on {}", step.from, step.to, step.trigger);
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
