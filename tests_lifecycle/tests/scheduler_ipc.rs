//! Scheduler IPC Tests
//!
//! Drives a full application lifecycle with the process side reached
//! through the encoded proxy/stub pair instead of a direct recorder.

use app_scheduler::{
    AppSchedulerProxy, LoopbackTransport, RecordingScheduler, SchedulerCommand, SchedulerStub,
};
use core_types::{AbilityState, ApplicationState};
use std::sync::Arc;
use tests_lifecycle::{demo_ability, demo_app, test_bootstrap};

/// Test: Every command the manager issues survives the wire encoding
#[test]
fn test_lifecycle_over_encoded_connection() {
    let harness = test_bootstrap();
    let (token, id) = harness.load(&demo_app(), &demo_ability("Main"));
    let id = id.expect("record created");

    let remote = RecordingScheduler::new();
    let proxy = AppSchedulerProxy::new(LoopbackTransport::new(SchedulerStub::new(remote.clone())));
    harness
        .service
        .attach_application(harness.pid_of(id), Some(Arc::new(proxy)));

    harness.service.update_ability_state(token, AbilityState::Foreground);
    harness.service.application_foregrounded(id);
    harness.service.update_ability_state(token, AbilityState::Background);
    harness.service.application_backgrounded(id);
    harness.service.terminate_ability(token);
    harness.service.ability_terminated(token);

    let commands = remote.commands();
    assert_eq!(commands.len(), 6);
    match &commands[0] {
        SchedulerCommand::LaunchApplication(data) => {
            assert_eq!(data.record_id, id);
            assert_eq!(data.app_info, demo_app());
        }
        other => panic!("unexpected command {:?}", other),
    }
    assert_eq!(
        commands[1],
        SchedulerCommand::LaunchAbility {
            info: demo_ability("Main"),
            token,
        }
    );
    assert_eq!(
        &commands[2..],
        &[
            SchedulerCommand::ForegroundApplication,
            SchedulerCommand::BackgroundApplication,
            SchedulerCommand::CleanAbility(token),
            SchedulerCommand::TerminateApplication,
        ]
    );

    harness.service.application_terminated(id);
    assert_eq!(
        harness.observer.app_states(id),
        vec![
            ApplicationState::Create,
            ApplicationState::Ready,
            ApplicationState::Foreground,
            ApplicationState::Background,
            ApplicationState::Terminated,
        ]
    );
    assert_eq!(
        harness.observer.ability_states(token),
        vec![AbilityState::Foreground, AbilityState::Background]
    );
}

/// Test: Observers may call back into the manager from a notification
#[test]
fn test_observer_reentry_does_not_deadlock() {
    use core_types::{AbilityToken, AppRecordId};
    use parking_lot::Mutex;
    use services_app_manager::{AppMgrService, AppProcessData, AppStateCallback};
    use std::sync::Weak;

    struct Reentrant {
        service: Weak<AppMgrService>,
        seen: Mutex<Vec<(AppRecordId, usize)>>,
    }

    impl AppStateCallback for Reentrant {
        fn on_app_state_changed(&self, data: &AppProcessData) {
            if let Some(service) = self.service.upgrade() {
                let count = service.record_count();
                self.seen.lock().push((data.record_id, count));
            }
        }

        fn on_ability_request_done(&self, _token: AbilityToken, _state: AbilityState) {}
    }

    let harness = test_bootstrap();
    let observer = Arc::new(Reentrant {
        service: Arc::downgrade(&harness.service),
        seen: Mutex::new(Vec::new()),
    });
    harness.service.register_app_state_callback(observer.clone());

    let (_, id) = harness.load(&demo_app(), &demo_ability("Main"));
    let id = id.expect("record created");
    harness.service.application_terminated(id);

    assert_eq!(*observer.seen.lock(), vec![(id, 1), (id, 0)]);
}
