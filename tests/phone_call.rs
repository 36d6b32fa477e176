//! Telephone call scenario driven through both engines.

use parking_lot::Mutex;
use statecraft::logging::{Level, MemorySink};
use statecraft::{state_enum, trigger_enum, ActionError, Engine, FireOutcome, ThreadSafeEngine};
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

#[derive(Clone, Debug, PartialEq)]
enum CallData {
    Callee(String),
    Volume(u8),
}

#[derive(Default)]
struct Phone {
    callee: Mutex<Option<String>>,
    muted: AtomicBool,
    volume: AtomicU8,
    timer: Mutex<Vec<&'static str>>,
}

fn phone_engine(phone: &Arc<Phone>, sink: &MemorySink) -> Engine<CallState, CallTrigger, CallData> {
    let mut engine = Engine::with_logger(CallState::OnHook, Arc::new(sink.clone()));

    engine
        .configure(CallState::OnHook)
        .permit(CallTrigger::TakeOffHook, CallState::OffHook);

    engine
        .configure(CallState::OffHook)
        .permit(CallTrigger::CallDialed, CallState::Ringing)
        .permit(CallTrigger::Hangup, CallState::OnHook);

    let dialed = Arc::clone(phone);
    engine
        .configure(CallState::Ringing)
        .on_entry(move |payload, _| match payload {
            Some(CallData::Callee(name)) => {
                *dialed.callee.lock() = Some(name.clone());
                Ok(())
            }
            other => Err(format!("expected a callee, got {other:?}").into()),
        })
        .permit(CallTrigger::CallConnected, CallState::Connected)
        .permit(CallTrigger::Hangup, CallState::OnHook);

    let started = Arc::clone(phone);
    let stopped = Arc::clone(phone);
    let volume = Arc::clone(phone);
    let mute = Arc::clone(phone);
    let not_muted = Arc::clone(phone);
    let unmute = Arc::clone(phone);
    engine
        .configure(CallState::Connected)
        .on_entry(move |_, _| {
            started.timer.lock().push("started");
            Ok(())
        })
        .on_exit(move |_, _| {
            stopped.timer.lock().push("stopped");
            Ok(())
        })
        .permit_internal(CallTrigger::SetVolume, move |payload, _| {
            let Some(CallData::Volume(level)) = payload else {
                return Err(ActionError::from("volume payload missing"));
            };
            volume.volume.store(*level, Ordering::SeqCst);
            Ok(())
        })
        .permit_internal_if(
            CallTrigger::MuteMicrophone,
            move |_, _| {
                mute.muted.store(true, Ordering::SeqCst);
                Ok(())
            },
            move || !not_muted.muted.load(Ordering::SeqCst),
        )
        .permit_internal(CallTrigger::UnmuteMicrophone, move |_, _| {
            unmute.muted.store(false, Ordering::SeqCst);
            Ok(())
        })
        .permit(CallTrigger::PlacedOnHold, CallState::OnHold)
        .permit(CallTrigger::Hangup, CallState::OnHook);

    engine
        .configure(CallState::OnHold)
        .permit(CallTrigger::TakenOffHold, CallState::Connected)
        .permit(CallTrigger::Hangup, CallState::OnHook)
        .permit(CallTrigger::PhoneHurledAgainstWall, CallState::PhoneDestroyed);

    engine.configure(CallState::PhoneDestroyed);

    engine
}

#[test]
fn phone_call_walkthrough() {
    let phone = Arc::new(Phone::default());
    let sink = MemorySink::new();
    let mut engine = phone_engine(&phone, &sink);

    assert!(engine.fire(CallTrigger::TakeOffHook).unwrap());
    assert_eq!(engine.current_state(), &CallState::OffHook);

    assert!(engine
        .fire_with(CallTrigger::CallDialed, CallData::Callee("B".to_string()))
        .unwrap());
    assert_eq!(engine.current_state(), &CallState::Ringing);
    assert_eq!(phone.callee.lock().as_deref(), Some("B"));

    assert!(engine.fire(CallTrigger::CallConnected).unwrap());
    assert_eq!(engine.current_state(), &CallState::Connected);
    assert_eq!(*phone.timer.lock(), vec!["started"]);

    assert_eq!(
        engine.process(CallTrigger::MuteMicrophone, None).unwrap(),
        FireOutcome::Internal
    );
    assert!(phone.muted.load(Ordering::SeqCst));
    assert_eq!(engine.current_state(), &CallState::Connected);

    assert!(!engine.fire(CallTrigger::MuteMicrophone).unwrap());
    assert_eq!(engine.current_state(), &CallState::Connected);
    assert!(phone.muted.load(Ordering::SeqCst));

    assert!(engine.fire(CallTrigger::Hangup).unwrap());
    assert_eq!(engine.current_state(), &CallState::OnHook);
    assert_eq!(*phone.timer.lock(), vec!["started", "stopped"]);

    assert_eq!(
        engine.history().get_path(),
        vec![
            &CallState::OnHook,
            &CallState::OffHook,
            &CallState::Ringing,
            &CallState::Connected,
            &CallState::OnHook,
        ]
    );
    assert!(sink.at_level(Level::ERROR).is_empty());
}

#[test]
fn volume_and_unmute_are_internal() {
    let phone = Arc::new(Phone::default());
    let mut engine = phone_engine(&phone, &MemorySink::new());
    engine.fire(CallTrigger::TakeOffHook).unwrap();
    engine
        .fire_with(CallTrigger::CallDialed, CallData::Callee("C".to_string()))
        .unwrap();
    engine.fire(CallTrigger::CallConnected).unwrap();

    assert!(engine
        .fire_with(CallTrigger::SetVolume, CallData::Volume(7))
        .unwrap());
    assert_eq!(phone.volume.load(Ordering::SeqCst), 7);

    assert!(engine.fire(CallTrigger::MuteMicrophone).unwrap());
    assert!(engine.fire(CallTrigger::UnmuteMicrophone).unwrap());
    assert!(engine.fire(CallTrigger::MuteMicrophone).unwrap());
    assert!(phone.muted.load(Ordering::SeqCst));

    assert_eq!(engine.current_state(), &CallState::Connected);
    assert_eq!(*phone.timer.lock(), vec!["started"]);
}

#[test]
fn dialing_without_callee_fails_after_entering_ringing() {
    let phone = Arc::new(Phone::default());
    let mut engine = phone_engine(&phone, &MemorySink::new());
    engine.fire(CallTrigger::TakeOffHook).unwrap();

    let err = engine.fire(CallTrigger::CallDialed).unwrap_err();

    assert!(err.to_string().contains("Entry hook of state 'Ringing'"));
    assert_eq!(engine.current_state(), &CallState::Ringing);
    assert!(phone.callee.lock().is_none());
}

#[test]
fn missing_volume_payload_is_an_internal_action_error() {
    let phone = Arc::new(Phone::default());
    let mut engine = phone_engine(&phone, &MemorySink::new());
    engine.fire(CallTrigger::TakeOffHook).unwrap();
    engine
        .fire_with(CallTrigger::CallDialed, CallData::Callee("B".to_string()))
        .unwrap();
    engine.fire(CallTrigger::CallConnected).unwrap();

    let err = engine.fire(CallTrigger::SetVolume).unwrap_err();

    assert!(matches!(
        err,
        statecraft::FsmError::InternalAction { ref state, ref trigger, .. }
            if state == "Connected" && trigger == "SetVolume"
    ));
    assert_eq!(engine.current_state(), &CallState::Connected);
}

#[test]
fn hurled_phone_reaches_final_state() {
    let phone = Arc::new(Phone::default());
    let sink = MemorySink::new();
    let mut engine = phone_engine(&phone, &sink);
    engine.fire(CallTrigger::TakeOffHook).unwrap();
    engine
        .fire_with(CallTrigger::CallDialed, CallData::Callee("B".to_string()))
        .unwrap();
    engine.fire(CallTrigger::CallConnected).unwrap();
    engine.fire(CallTrigger::PlacedOnHold).unwrap();

    assert!(engine.fire(CallTrigger::PhoneHurledAgainstWall).unwrap());
    assert!(engine.is_final());
    assert!(sink.contains(Level::INFO, "Reached final state PhoneDestroyed"));
    assert!(!engine.fire(CallTrigger::Hangup).unwrap());
}

#[test]
fn threaded_phone_call_matches_synchronous_run() {
    let phone = Arc::new(Phone::default());
    let sink = MemorySink::new();
    let machine = ThreadSafeEngine::spawn(phone_engine(&phone, &sink)).unwrap();

    machine.fire(CallTrigger::TakeOffHook).unwrap();
    machine
        .fire_with(CallTrigger::CallDialed, CallData::Callee("B".to_string()))
        .unwrap();
    machine.fire(CallTrigger::CallConnected).unwrap();
    machine
        .fire_with(CallTrigger::SetVolume, CallData::Volume(3))
        .unwrap();
    machine.fire(CallTrigger::MuteMicrophone).unwrap();
    machine.fire(CallTrigger::MuteMicrophone).unwrap();
    machine.fire(CallTrigger::Hangup).unwrap();

    let engine = machine.shutdown().unwrap().expect("first shutdown returns the engine");

    assert_eq!(engine.current_state(), &CallState::OnHook);
    assert_eq!(machine.current_state(), CallState::OnHook);
    assert_eq!(phone.callee.lock().as_deref(), Some("B"));
    assert_eq!(phone.volume.load(Ordering::SeqCst), 3);
    assert!(phone.muted.load(Ordering::SeqCst));
    assert_eq!(*phone.timer.lock(), vec!["started", "stopped"]);

    let stats = machine.stats();
    assert_eq!(stats.received, 7);
    assert_eq!(stats.transitioned, 4);
    assert_eq!(stats.internal, 2);
    assert_eq!(stats.unhandled, 1);
    assert_eq!(stats.failed, 0);
}
