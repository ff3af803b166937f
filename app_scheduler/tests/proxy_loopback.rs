//! Proxy -> wire -> stub round trips

use app_scheduler::{
    AppLaunchData, AppScheduler, AppSchedulerProxy, LoopbackTransport, RecordingScheduler,
    SchedulerCommand, SchedulerError, SchedulerStub, SchedulerTransport,
};
use core_types::{AbilityInfo, AbilityToken, AppRecordId, ApplicationInfo, BundleIdentity};
use ipc::Parcel;

fn connected_pair() -> (AppSchedulerProxy<LoopbackTransport<RecordingScheduler>>, RecordingScheduler) {
    let remote = RecordingScheduler::new();
    let transport = LoopbackTransport::new(SchedulerStub::new(remote.clone()));
    (AppSchedulerProxy::new(transport), remote)
}

#[test]
fn test_commands_cross_the_wire_in_order() {
    let (proxy, remote) = connected_pair();
    let token = AbilityToken::new();
    let info = AbilityInfo::new("MainAbility", "demo", BundleIdentity::new("com.demo"));
    let launch = AppLaunchData {
        app_info: ApplicationInfo::new("demo", "com.demo"),
        process_name: "com.demo".to_string(),
        record_id: AppRecordId::from_raw(1),
        uid: 0,
    };

    proxy.schedule_launch_application(&launch);
    proxy.schedule_launch_ability(&info, token);
    proxy.schedule_foreground_application();
    proxy.schedule_background_application();
    proxy.schedule_clean_ability(token);
    proxy.schedule_shrink_memory(10);
    proxy.schedule_low_memory();
    proxy.schedule_terminate_application();

    assert_eq!(
        remote.commands(),
        vec![
            SchedulerCommand::LaunchApplication(launch),
            SchedulerCommand::LaunchAbility { info, token },
            SchedulerCommand::ForegroundApplication,
            SchedulerCommand::BackgroundApplication,
            SchedulerCommand::CleanAbility(token),
            SchedulerCommand::ShrinkMemory(10),
            SchedulerCommand::LowMemory,
            SchedulerCommand::TerminateApplication,
        ]
    );
}

#[test]
fn test_send_reports_disconnect() {
    let remote = RecordingScheduler::new();
    let mut transport = LoopbackTransport::new(SchedulerStub::new(remote.clone()));
    transport.disconnect();
    let proxy = AppSchedulerProxy::new(transport);

    assert_eq!(
        proxy.send(&SchedulerCommand::LowMemory),
        Err(SchedulerError::Disconnected)
    );

    // Trait methods swallow the error.
    proxy.schedule_low_memory();
    assert!(remote.is_empty());
}

#[test]
fn test_stub_rejects_unknown_code() {
    let remote = RecordingScheduler::new();
    let mut transport = LoopbackTransport::new(SchedulerStub::new(remote.clone()));

    assert_eq!(
        transport.send_one_way(1234, Parcel::new()),
        Err(SchedulerError::UnknownCode(1234))
    );
    assert!(transport.stub().scheduler().is_empty());
}
