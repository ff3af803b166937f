//! Scheduler commands and their wire encoding
//!
//! Each command travels as a `(code, parcel)` pair. The code selects the
//! command; the parcel carries its arguments in declaration order.

use crate::{AppScheduler, SchedulerError};
use core_types::{
    AbilityInfo, AbilityToken, AbilityType, AppRecordId, ApplicationInfo, BundleIdentity,
    LaunchMode,
};
use ipc::{Parcel, ParcelError, Parcelable};

pub const FOREGROUND_APPLICATION: u32 = 0;
pub const BACKGROUND_APPLICATION: u32 = 1;
pub const TERMINATE_APPLICATION: u32 = 2;
pub const LOW_MEMORY: u32 = 3;
pub const SHRINK_MEMORY: u32 = 4;
pub const LAUNCH_ABILITY: u32 = 5;
pub const CLEAN_ABILITY: u32 = 6;
pub const LAUNCH_APPLICATION: u32 = 7;

/// Everything a process needs to initialize its application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppLaunchData {
    pub app_info: ApplicationInfo,
    pub process_name: String,
    pub record_id: AppRecordId,
    pub uid: i32,
}

impl Parcelable for AppLaunchData {
    fn marshal(&self, parcel: &mut Parcel) -> Result<(), ParcelError> {
        write_application_info(parcel, &self.app_info)?;
        parcel.write_string(&self.process_name)?;
        parcel.write_i32(self.record_id.as_raw());
        parcel.write_i32(self.uid);
        Ok(())
    }

    fn unmarshal(parcel: &mut Parcel) -> Result<Self, ParcelError> {
        Ok(Self {
            app_info: read_application_info(parcel)?,
            process_name: parcel.read_string()?,
            record_id: AppRecordId::from_raw(parcel.read_i32()?),
            uid: parcel.read_i32()?,
        })
    }
}

fn write_application_info(parcel: &mut Parcel, info: &ApplicationInfo) -> Result<(), ParcelError> {
    parcel.write_string(&info.name)?;
    parcel.write_string(&info.bundle_name)?;
    match info.uid {
        Some(uid) => {
            parcel.write_bool(true);
            parcel.write_i32(uid);
        }
        None => parcel.write_bool(false),
    }
    Ok(())
}

fn read_application_info(parcel: &mut Parcel) -> Result<ApplicationInfo, ParcelError> {
    let name = parcel.read_string()?;
    let bundle_name = parcel.read_string()?;
    let uid = if parcel.read_bool()? {
        Some(parcel.read_i32()?)
    } else {
        None
    };
    Ok(ApplicationInfo {
        name,
        bundle_name,
        uid,
    })
}

fn write_ability_info(parcel: &mut Parcel, info: &AbilityInfo) -> Result<(), ParcelError> {
    parcel.write_string(&info.name)?;
    parcel.write_string(&info.application_name)?;
    parcel.write_string(&info.bundle.bundle_name)?;
    parcel.write_string(&info.bundle.module_name)?;
    parcel.write_string(&info.bundle.device_id)?;
    parcel.write_i32(info.kind.as_i32());
    parcel.write_i32(info.launch_mode.as_i32());
    parcel.write_string(&info.process)
}

fn read_ability_info(parcel: &mut Parcel) -> Result<AbilityInfo, ParcelError> {
    let name = parcel.read_string()?;
    let application_name = parcel.read_string()?;
    let bundle = BundleIdentity {
        bundle_name: parcel.read_string()?,
        module_name: parcel.read_string()?,
        device_id: parcel.read_string()?,
    };
    let raw_kind = parcel.read_i32()?;
    let kind = AbilityType::from_i32(raw_kind).ok_or(ParcelError::InvalidValue {
        field: "ability type",
        value: raw_kind,
    })?;
    let raw_mode = parcel.read_i32()?;
    let launch_mode = LaunchMode::from_i32(raw_mode).ok_or(ParcelError::InvalidValue {
        field: "launch mode",
        value: raw_mode,
    })?;
    Ok(AbilityInfo {
        name,
        application_name,
        bundle,
        kind,
        launch_mode,
        process: parcel.read_string()?,
    })
}

/// A lifecycle command addressed to one process
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerCommand {
    LaunchApplication(AppLaunchData),
    LaunchAbility {
        info: AbilityInfo,
        token: AbilityToken,
    },
    ForegroundApplication,
    BackgroundApplication,
    TerminateApplication,
    CleanAbility(AbilityToken),
    ShrinkMemory(i32),
    LowMemory,
}

impl SchedulerCommand {
    /// Wire code of the command
    pub fn code(&self) -> u32 {
        match self {
            SchedulerCommand::LaunchApplication(_) => LAUNCH_APPLICATION,
            SchedulerCommand::LaunchAbility { .. } => LAUNCH_ABILITY,
            SchedulerCommand::ForegroundApplication => FOREGROUND_APPLICATION,
            SchedulerCommand::BackgroundApplication => BACKGROUND_APPLICATION,
            SchedulerCommand::TerminateApplication => TERMINATE_APPLICATION,
            SchedulerCommand::CleanAbility(_) => CLEAN_ABILITY,
            SchedulerCommand::ShrinkMemory(_) => SHRINK_MEMORY,
            SchedulerCommand::LowMemory => LOW_MEMORY,
        }
    }

    /// Serializes the command arguments
    pub fn encode(&self) -> Result<(u32, Parcel), SchedulerError> {
        let mut parcel = Parcel::new();
        match self {
            SchedulerCommand::LaunchApplication(data) => data.marshal(&mut parcel)?,
            SchedulerCommand::LaunchAbility { info, token } => {
                write_ability_info(&mut parcel, info)?;
                parcel.write_token(token);
            }
            SchedulerCommand::CleanAbility(token) => parcel.write_token(token),
            SchedulerCommand::ShrinkMemory(level) => parcel.write_i32(*level),
            SchedulerCommand::ForegroundApplication
            | SchedulerCommand::BackgroundApplication
            | SchedulerCommand::TerminateApplication
            | SchedulerCommand::LowMemory => {}
        }
        Ok((self.code(), parcel))
    }

    /// Rebuilds a command from its wire code and arguments
    pub fn decode(code: u32, parcel: &mut Parcel) -> Result<Self, SchedulerError> {
        let command = match code {
            LAUNCH_APPLICATION => SchedulerCommand::LaunchApplication(AppLaunchData::unmarshal(parcel)?),
            LAUNCH_ABILITY => SchedulerCommand::LaunchAbility {
                info: read_ability_info(parcel)?,
                token: parcel.read_token()?,
            },
            FOREGROUND_APPLICATION => SchedulerCommand::ForegroundApplication,
            BACKGROUND_APPLICATION => SchedulerCommand::BackgroundApplication,
            TERMINATE_APPLICATION => SchedulerCommand::TerminateApplication,
            CLEAN_ABILITY => SchedulerCommand::CleanAbility(parcel.read_token()?),
            SHRINK_MEMORY => SchedulerCommand::ShrinkMemory(parcel.read_i32()?),
            LOW_MEMORY => SchedulerCommand::LowMemory,
            other => return Err(SchedulerError::UnknownCode(other)),
        };
        Ok(command)
    }

    /// Invokes the matching method on `scheduler`
    pub fn deliver(&self, scheduler: &dyn AppScheduler) {
        match self {
            SchedulerCommand::LaunchApplication(data) => scheduler.schedule_launch_application(data),
            SchedulerCommand::LaunchAbility { info, token } => {
                scheduler.schedule_launch_ability(info, *token)
            }
            SchedulerCommand::ForegroundApplication => scheduler.schedule_foreground_application(),
            SchedulerCommand::BackgroundApplication => scheduler.schedule_background_application(),
            SchedulerCommand::TerminateApplication => scheduler.schedule_terminate_application(),
            SchedulerCommand::CleanAbility(token) => scheduler.schedule_clean_ability(*token),
            SchedulerCommand::ShrinkMemory(level) => scheduler.schedule_shrink_memory(*level),
            SchedulerCommand::LowMemory => scheduler.schedule_low_memory(),
        }
    }
}
