//! Registry of live application records

use crate::app_record::{AddAbilityOutcome, AppRunningRecord};
use crate::{AppMgrError, RecordQueryResult};
use core_types::{is_valid_uid, AbilityInfo, AbilityToken, AppRecordId, ApplicationInfo, ProcessId};
use std::collections::BTreeMap;
use tracing::debug;

/// Owns every [`AppRunningRecord`], keyed by record id
///
/// Not synchronized on its own; the manager keeps it behind one lock.
#[derive(Debug)]
pub struct AppRunningManager {
    records: BTreeMap<AppRecordId, AppRunningRecord>,
    next_id: i32,
}

impl AppRunningManager {
    pub fn new() -> Self {
        Self {
            records: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Ids are never reused; once `i32::MAX` has been handed out the
    /// registry refuses new records
    fn allocate_id(&mut self) -> Result<AppRecordId, AppMgrError> {
        let id = AppRecordId::from_raw(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or(AppMgrError::IdsExhausted)?;
        Ok(id)
    }

    /// Finds the record for `process_name`, creating it if needed, then
    /// registers the ability under `token`
    ///
    /// All inputs are validated before anything is created. A token already
    /// registered under another process is rejected with
    /// [`AppMgrError::AlreadyExists`].
    pub fn get_or_create(
        &mut self,
        token: Option<AbilityToken>,
        app_info: Option<&ApplicationInfo>,
        ability_info: Option<&AbilityInfo>,
        process_name: &str,
        uid: i32,
    ) -> Result<RecordQueryResult, AppMgrError> {
        let app_info = app_info.ok_or(AppMgrError::InvalidArgument("application info"))?;
        let ability_info = ability_info.ok_or(AppMgrError::InvalidArgument("ability info"))?;
        let token = token.ok_or(AppMgrError::InvalidArgument("token"))?;
        if !is_valid_uid(uid) {
            return Err(AppMgrError::InvalidUid(uid));
        }
        if process_name.is_empty() {
            return Err(AppMgrError::InvalidArgument("process name"));
        }

        if let Some(owner) = self.find_by_token(token) {
            if owner.process_name() != process_name {
                return Err(AppMgrError::AlreadyExists(token));
            }
        }

        let (record_id, app_exists) = match self.find_by_process_name(process_name) {
            Some(record) => (record.record_id(), true),
            None => {
                let id = self.allocate_id()?;
                let record = AppRunningRecord::new(id, app_info.clone(), process_name, uid);
                self.records.insert(id, record);
                debug!(record_id = %id, process_name, uid, "created application record");
                (id, false)
            }
        };

        let record = self
            .records
            .get_mut(&record_id)
            .ok_or_else(|| AppMgrError::record_not_found(record_id))?;

        let ability_exists = if record.ability(token).is_some() {
            true
        } else {
            match record.add_ability(Some(token), Some(ability_info))? {
                AddAbilityOutcome::Added(_) => false,
                AddAbilityOutcome::ExistingSingleton(_) => true,
            }
        };

        Ok(RecordQueryResult {
            app_record_id: record_id,
            app_exists,
            ability_exists,
        })
    }

    pub fn get(&self, id: AppRecordId) -> Option<&AppRunningRecord> {
        self.records.get(&id)
    }

    pub fn get_mut(&mut self, id: AppRecordId) -> Option<&mut AppRunningRecord> {
        self.records.get_mut(&id)
    }

    pub fn find_by_process_name(&self, process_name: &str) -> Option<&AppRunningRecord> {
        self.records
            .values()
            .find(|r| r.process_name() == process_name)
    }

    pub fn find_by_name_and_process(
        &self,
        app_name: &str,
        process_name: &str,
    ) -> Option<&AppRunningRecord> {
        self.records
            .values()
            .find(|r| r.name() == app_name && r.process_name() == process_name)
    }

    pub fn find_by_app_name(&self, app_name: &str) -> Option<&AppRunningRecord> {
        self.records.values().find(|r| r.name() == app_name)
    }

    /// Only records whose spawn completed carry a pid
    pub fn find_by_pid(&self, pid: ProcessId) -> Option<&AppRunningRecord> {
        self.records.values().find(|r| r.pid() == Some(pid))
    }

    pub fn find_id_by_pid(&self, pid: ProcessId) -> Option<AppRecordId> {
        self.find_by_pid(pid).map(AppRunningRecord::record_id)
    }

    pub fn find_by_token(&self, token: AbilityToken) -> Option<&AppRunningRecord> {
        self.records.values().find(|r| r.ability(token).is_some())
    }

    pub fn find_id_by_token(&self, token: AbilityToken) -> Option<AppRecordId> {
        self.find_by_token(token).map(AppRunningRecord::record_id)
    }

    pub fn find_by_token_mut(&mut self, token: AbilityToken) -> Option<&mut AppRunningRecord> {
        self.records
            .values_mut()
            .find(|r| r.ability(token).is_some())
    }

    pub fn remove(&mut self, id: AppRecordId) -> Option<AppRunningRecord> {
        self.records.remove(&id)
    }

    pub fn records(&self) -> impl Iterator<Item = &AppRunningRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl Default for AppRunningManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{BundleIdentity, LaunchMode, MAX_UID};

    fn app() -> ApplicationInfo {
        ApplicationInfo::new("demo", "com.demo")
    }

    fn ability(name: &str) -> AbilityInfo {
        AbilityInfo::new(name, "demo", BundleIdentity::new("com.demo"))
    }

    #[test]
    fn test_same_token_twice_reuses_record() {
        let mut manager = AppRunningManager::new();
        let token = AbilityToken::new();

        let first = manager
            .get_or_create(Some(token), Some(&app()), Some(&ability("Main")), "com.demo", 0)
            .unwrap();
        let second = manager
            .get_or_create(Some(token), Some(&app()), Some(&ability("Main")), "com.demo", 0)
            .unwrap();

        assert!(!first.app_exists);
        assert!(!first.ability_exists);
        assert!(second.app_exists);
        assert!(second.ability_exists);
        assert_eq!(first.app_record_id, second.app_record_id);
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_uid_bounds() {
        let mut manager = AppRunningManager::new();
        for uid in [-1, MAX_UID] {
            let result = manager.get_or_create(
                Some(AbilityToken::new()),
                Some(&app()),
                Some(&ability("Main")),
                "com.demo",
                uid,
            );
            assert_eq!(result, Err(AppMgrError::InvalidUid(uid)));
        }
        assert!(manager.is_empty());

        for (uid, process) in [(0, "p0"), (MAX_UID - 1, "p1")] {
            assert!(manager
                .get_or_create(
                    Some(AbilityToken::new()),
                    Some(&app()),
                    Some(&ability("Main")),
                    process,
                    uid
                )
                .is_ok());
        }
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn test_missing_inputs_rejected() {
        let mut manager = AppRunningManager::new();
        let token = Some(AbilityToken::new());

        assert_eq!(
            manager.get_or_create(token, None, Some(&ability("Main")), "com.demo", 0),
            Err(AppMgrError::InvalidArgument("application info"))
        );
        assert_eq!(
            manager.get_or_create(token, Some(&app()), None, "com.demo", 0),
            Err(AppMgrError::InvalidArgument("ability info"))
        );
        assert_eq!(
            manager.get_or_create(None, Some(&app()), Some(&ability("Main")), "com.demo", 0),
            Err(AppMgrError::InvalidArgument("token"))
        );
        assert!(manager.is_empty());
    }

    #[test]
    fn test_record_ids_are_monotonic() {
        let mut manager = AppRunningManager::new();
        let mut last = 0;
        for i in 0..5 {
            let result = manager
                .get_or_create(
                    Some(AbilityToken::new()),
                    Some(&app()),
                    Some(&ability("Main")),
                    &format!("proc{}", i),
                    0,
                )
                .unwrap();
            assert!(result.app_record_id.as_raw() > last);
            last = result.app_record_id.as_raw();
            manager.remove(result.app_record_id);
        }
    }

    #[test]
    fn test_singleton_reported_as_existing() {
        let mut manager = AppRunningManager::new();
        let info = ability("Main").with_launch_mode(LaunchMode::Singleton);

        manager
            .get_or_create(Some(AbilityToken::new()), Some(&app()), Some(&info), "com.demo", 0)
            .unwrap();
        let second = manager
            .get_or_create(Some(AbilityToken::new()), Some(&app()), Some(&info), "com.demo", 0)
            .unwrap();

        assert!(second.ability_exists);
        let record = manager.get(second.app_record_id).unwrap();
        assert_eq!(record.ability_count(), 1);
    }

    #[test]
    fn test_token_bound_to_one_process() {
        let mut manager = AppRunningManager::new();
        let token = AbilityToken::new();

        let first = manager
            .get_or_create(Some(token), Some(&app()), Some(&ability("Main")), "proc.a", 0)
            .unwrap();
        let second =
            manager.get_or_create(Some(token), Some(&app()), Some(&ability("Main")), "proc.b", 0);

        assert_eq!(second, Err(AppMgrError::AlreadyExists(token)));
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.find_id_by_token(token), Some(first.app_record_id));
        assert!(manager.find_by_process_name("proc.b").is_none());
    }

    #[test]
    fn test_id_exhaustion_is_an_error() {
        let mut manager = AppRunningManager::new();
        manager.next_id = i32::MAX;

        let last = manager
            .get_or_create(Some(AbilityToken::new()), Some(&app()), Some(&ability("Main")), "last", 0)
            .unwrap();
        assert_eq!(last.app_record_id.as_raw(), i32::MAX);

        let result = manager.get_or_create(
            Some(AbilityToken::new()),
            Some(&app()),
            Some(&ability("Main")),
            "overflow",
            0,
        );
        assert_eq!(result, Err(AppMgrError::IdsExhausted));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_lookups() {
        let mut manager = AppRunningManager::new();
        let token = AbilityToken::new();
        let id = manager
            .get_or_create(Some(token), Some(&app()), Some(&ability("Main")), "com.demo:bg", 0)
            .unwrap()
            .app_record_id;

        assert!(manager.find_by_pid(ProcessId::new(77)).is_none());
        manager.get_mut(id).unwrap().set_pid(ProcessId::new(77));

        assert_eq!(manager.find_id_by_pid(ProcessId::new(77)), Some(id));
        assert_eq!(manager.find_by_token(token).unwrap().record_id(), id);
        assert_eq!(manager.find_by_app_name("demo").unwrap().record_id(), id);
        assert!(manager.find_by_name_and_process("demo", "com.demo:bg").is_some());
        assert!(manager.find_by_name_and_process("demo", "com.demo").is_none());

        assert!(manager.remove(id).is_some());
        assert!(manager.find_by_token(token).is_none());
        assert!(manager.remove(id).is_none());
    }
}
