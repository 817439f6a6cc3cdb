use crate::{AppCommand, AppError, HotkeyHandler};

use global_hotkey::{
    GlobalHotKeyEvent, HotKeyState,
    hotkey::{Code, HotKey, Modifiers},
};
use replay_saver_core::TriggerSource;
use tokio::sync::mpsc;

/// WHAT: The classic binding syntax parses
/// WHY: Existing settings files use `ctrl+alt+s` style bindings
#[test]
#[allow(clippy::unwrap_used)]
fn given_ctrl_alt_s_when_parsing_then_matching_hotkey() {
    // Given/When: Parsing the binding
    let hotkey = HotkeyHandler::parse_binding("ctrl+alt+s").unwrap();

    // Then: Same hotkey as built by hand
    let expected = HotKey::new(Some(Modifiers::CONTROL | Modifiers::ALT), Code::KeyS);
    assert_eq!(hotkey.id(), expected.id());
}

/// WHAT: Surrounding whitespace is ignored
/// WHY: Bindings typed at the prompt may carry stray spaces
#[test]
fn given_padded_binding_when_parsing_then_succeeds() {
    assert!(HotkeyHandler::parse_binding("  shift+KeyR  ").is_ok());
}

/// WHAT: Registering an unparsable binding fails before any OS hotkey is touched
/// WHY: Startup checks the hotkey before the tray icon exists and exits with code 1
#[test]
#[allow(clippy::panic)]
fn given_unparsable_binding_when_registering_then_registration_failed() {
    let result = HotkeyHandler::register_hotkey("ctrl+alt+banana");

    match result {
        Err(AppError::HotkeyRegistrationFailed { reason, .. }) => {
            assert!(reason.contains("ctrl+alt+banana"));
        }
        Err(other) => panic!("expected registration failure, got {:?}", other),
        Ok(_) => panic!("unparsable binding was registered"),
    }
}

/// WHAT: Unknown keys are rejected as registration failures
/// WHY: A bad hotkey is fatal at startup and must say why
#[test]
fn given_unknown_key_when_parsing_then_registration_failed() {
    let result = HotkeyHandler::parse_binding("ctrl+alt+notakey");

    assert!(matches!(
        result,
        Err(AppError::HotkeyRegistrationFailed { .. })
    ));
}

/// WHAT: Only presses of our hotkey count
/// WHY: Key releases and other hotkeys must not trigger saves
#[test]
fn given_events_when_filtering_then_only_own_presses_match() {
    // Given: A handler for hotkey 42
    let (command_tx, _command_rx) = mpsc::channel::<AppCommand>(1);
    let handler = HotkeyHandler::new(42, command_tx);

    // When/Then: Only a press of id 42 matches
    assert!(handler.is_press(&GlobalHotKeyEvent {
        id: 42,
        state: HotKeyState::Pressed,
    }));
    assert!(!handler.is_press(&GlobalHotKeyEvent {
        id: 42,
        state: HotKeyState::Released,
    }));
    assert!(!handler.is_press(&GlobalHotKeyEvent {
        id: 7,
        state: HotKeyState::Pressed,
    }));
}

/// WHAT: Save request carries the hotkey as its source
/// WHY: Logs distinguish hotkey and tray triggers
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_open_channel_when_save_requested_then_command_received() {
    let (command_tx, mut command_rx) = mpsc::channel(32);

    command_tx
        .send(AppCommand::SaveReplay {
            source: TriggerSource::Hotkey,
        })
        .await
        .unwrap();

    let cmd = command_rx.recv().await.unwrap();
    assert!(matches!(
        cmd,
        AppCommand::SaveReplay {
            source: TriggerSource::Hotkey
        }
    ));
}
