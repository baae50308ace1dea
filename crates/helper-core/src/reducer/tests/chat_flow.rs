use super::*;
use pretty_assertions::assert_eq;

#[test]
fn send_appends_user_message_and_schedules_reply() {
    let mut state = state();
    let effects = run_user(&mut state, UserAction::SendChat("  hello there ".to_string()), at(5));

    assert_eq!(
        current_messages(&state).last(),
        Some(&(Role::User, "hello there".to_string()))
    );
    assert!(effects.contains(&HelperEffect::PersistSessions));
    let scheduled = effects.iter().find_map(|effect| match effect {
        HelperEffect::ScheduleReply { delay, .. } => Some(*delay),
        _ => None,
    });
    assert_eq!(scheduled, Some(AppConfig::default().reply_delay()));
    assert!(state.is_waiting_for_reply());
}

#[test]
fn blank_message_is_ignored() {
    let mut state = state();
    let before = current_messages(&state);
    let effects = run_user(&mut state, UserAction::SendChat("   ".to_string()), at(1));
    assert!(effects.is_empty());
    assert_eq!(current_messages(&state), before);
}

#[test]
fn missing_key_replies_immediately_without_scheduling() {
    let mut state = state();
    state.settings.api_keys.set(Provider::OpenAi, "");
    let effects = run_user(&mut state, UserAction::SendChat("hi".to_string()), at(1));

    assert!(!effects
        .iter()
        .any(|effect| matches!(effect, HelperEffect::ScheduleReply { .. })));
    assert_eq!(
        current_messages(&state).last(),
        Some(&(Role::Assistant, MISSING_KEY_REPLY.to_string()))
    );
    assert!(!state.is_waiting_for_reply());
}

#[test]
fn azure_key_alone_does_not_enable_chat() {
    let mut state = state();
    state.settings.api_keys.set(Provider::OpenAi, "");
    state.settings.api_keys.set(Provider::Azure, "az");
    assert!(send(&mut state, "hi", at(1)).is_none());
}

#[test]
fn reply_is_appended_and_session_date_touched() {
    let mut state = state();
    let reply = send(&mut state, "how do I list containers with a command?", at(10))
        .expect("reply scheduled");
    assert_eq!(reply.1, COMMAND_REPLY);

    let effects = deliver(&mut state, reply, at(12));
    assert_eq!(
        effects,
        vec![HelperEffect::PersistSessions, HelperEffect::RequestFrame]
    );
    assert_eq!(
        current_messages(&state).last(),
        Some(&(Role::Assistant, COMMAND_REPLY.to_string()))
    );
    assert_eq!(state.sessions.current().map(|s| s.date), Some(at(12)));
    assert!(!state.is_waiting_for_reply());
}

#[test]
fn input_submit_on_chat_panel_sends_the_draft() {
    let mut state = state();
    for ch in "ping".chars() {
        run_user(&mut state, UserAction::InputChar(ch), at(1));
    }
    run_user(&mut state, UserAction::InputBackspace, at(1));
    run_user(&mut state, UserAction::InputSubmit, at(2));

    assert_eq!(state.interaction.chat_input, "");
    assert_eq!(
        current_messages(&state).last(),
        Some(&(Role::User, "pin".to_string()))
    );
}

#[test]
fn new_sessions_get_increasing_serials_and_become_current() {
    let mut state = state();
    let first = state.sessions.current_id();
    run_user(&mut state, UserAction::StartNewSession, at(0));
    run_user(&mut state, UserAction::StartNewSession, at(0));

    let serials: Vec<usize> = state.sessions.sessions().iter().map(|s| s.serial).collect();
    assert_eq!(serials, vec![1, 2, 3]);
    let ids: Vec<SessionId> = state.sessions.sessions().iter().map(|s| s.id).collect();
    assert_eq!(ids[1], ids[0] + 1);
    assert_eq!(ids[2], ids[0] + 2);
    assert_ne!(state.sessions.current_id(), first);
    assert_eq!(state.sessions.current_id(), Some(ids[2]));
}

#[test]
fn rename_trims_and_blank_restores_default() {
    let mut state = state();
    run_user(&mut state, UserAction::RenameSession("  k8s debugging ".to_string()), at(1));
    assert_eq!(
        state.sessions.current().map(|s| s.title.as_str()),
        Some("k8s debugging")
    );

    run_user(&mut state, UserAction::RenameSession("   ".to_string()), at(1));
    assert_eq!(
        state.sessions.current().map(|s| s.title.as_str()),
        Some(crate::session::DEFAULT_TITLE)
    );
}
