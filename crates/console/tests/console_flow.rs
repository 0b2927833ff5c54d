use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;

use proptest::prelude::*;

use rolegate_access::audit::actions;
use rolegate_access::{
    AuditLogEntry, Capability, ModuleCatalog, ModuleId, Permission, PermissionMatrix, Role, User,
};
use rolegate_console::{
    Console, ConsoleError, ConsoleEvent, EmailAvailability, EmailStatus, NewUser, Session,
};
use rolegate_core::{DomainError, UserId};
use rolegate_events::{EventBus, InMemoryEventBus, Subscription};
use rolegate_infra::{
    ConsoleConfig, ConsoleStore, InMemoryConsoleStore, JsonFileStore, StoreError, StoredState,
};

type TestConsole = Console<Arc<InMemoryConsoleStore>, InMemoryEventBus<ConsoleEvent>>;

fn console() -> (TestConsole, Arc<InMemoryConsoleStore>) {
    let store = Arc::new(InMemoryConsoleStore::new());
    let console = Console::load(
        store.clone(),
        InMemoryEventBus::new(),
        ModuleCatalog::standard(),
    )
    .unwrap();
    (console, store)
}

fn module(id: &'static str) -> ModuleId {
    ModuleId::new(id)
}

fn admit(console: &mut TestConsole, name: &str, email: &str, role: Role) -> User {
    console.create_user(NewUser::new(name, email, role)).unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// Admission
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn new_viewer_is_read_only_clean_and_audited() {
    let (mut console, store) = console();
    let session = Session::new();

    let user = admit(&mut console, "Vera", "vera@example.com", Role::Viewer);

    for (_, permission) in user.permissions.iter() {
        assert_eq!(*permission, Permission::NONE.with(Capability::Read, true));
    }
    assert!(console.validation_errors(&session, user.id).is_empty());

    let log = console.audit_log(user.id);
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].action, actions::USER_CREATED);
    assert_eq!(log[0].details, "Created user Vera with viewer role");

    assert_eq!(store.user_count(), 1);
    assert_eq!(store.audit_count(), 1);
}

#[test]
fn duplicate_email_is_rejected_case_insensitively() {
    let (mut console, _) = console();
    admit(&mut console, "Alice", "alice@example.com", Role::Admin);

    let err = console
        .create_user(NewUser::new("Alice Two", "ALICE@example.com", Role::Viewer))
        .unwrap_err();

    assert!(matches!(err, ConsoleError::DuplicateEmail(ref e) if e == "ALICE@example.com"));
    assert_eq!(console.list_users().len(), 1);
}

#[test]
fn new_users_are_listed_first() {
    let (mut console, _) = console();
    let first = admit(&mut console, "First", "first@example.com", Role::Viewer);
    let second = admit(&mut console, "Second", "second@example.com", Role::Editor);

    let ids: Vec<UserId> = console.list_users().iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
}

#[test]
fn custom_admission_keeps_supplied_matrix() {
    let (mut console, _) = console();
    let mut matrix = PermissionMatrix::for_role(console.catalog(), Role::Custom);
    matrix
        .replace(&module("reports"), Permission::NONE.with(Capability::Read, true))
        .unwrap();

    let user = console
        .create_user(
            NewUser::new("Cat", "cat@example.com", Role::Custom).with_permissions(matrix.clone()),
        )
        .unwrap();

    assert_eq!(user.permissions, matrix);
    assert_eq!(console.get_user(user.id), Some(&user));
}

#[test]
fn search_matches_name_email_and_role() {
    let (mut console, _) = console();
    admit(&mut console, "Alice Johnson", "alice@example.com", Role::Admin);
    admit(&mut console, "Bob Smith", "bob@corp.test", Role::Editor);

    assert_eq!(console.search_users("johnson").len(), 1);
    assert_eq!(console.search_users("CORP").len(), 1);
    assert_eq!(console.search_users("editor")[0].name, "Bob Smith");
    assert_eq!(console.search_users("").len(), 2);
}

// ─────────────────────────────────────────────────────────────────────────────
// Editing and commit
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn assigning_admin_grants_everything() {
    let (mut console, _) = console();
    let user = admit(&mut console, "Ed", "ed@example.com", Role::Viewer);
    let mut session = Session::new();
    console.select_user(&mut session, Some(user.id)).unwrap();

    console.assign_role(&mut session, user.id, Role::Admin).unwrap();

    let draft = console.working_user(&session).unwrap();
    assert!(draft.permissions.iter().all(|(_, p)| *p == Permission::ALL));
    assert!(console.validation_errors(&session, user.id).is_empty());
    assert!(console.pending_changes(&session, user.id));
    // Not committed yet.
    assert_eq!(console.get_user(user.id).unwrap().role, Role::Viewer);
}

#[test]
fn clearing_write_cascades_to_delete() {
    let (mut console, _) = console();
    let user = admit(&mut console, "Cy", "cy@example.com", Role::Custom);
    let mut session = Session::new();
    console.select_user(&mut session, Some(user.id)).unwrap();

    for capability in [Capability::Read, Capability::Write, Capability::Delete] {
        console
            .set_capability(&mut session, user.id, &module("reports"), capability, true)
            .unwrap();
    }
    console
        .set_capability(&mut session, user.id, &module("reports"), Capability::Write, false)
        .unwrap();

    let draft = console.working_user(&session).unwrap();
    assert_eq!(
        draft.permissions.get(&module("reports")),
        Some(&Permission::NONE.with(Capability::Read, true))
    );
    assert!(session.errors().is_empty());
}

#[test]
fn clearing_read_cascades_everywhere() {
    let (mut console, _) = console();
    let user = admit(&mut console, "Ann", "ann@example.com", Role::Admin);
    let mut session = Session::new();
    console.select_user(&mut session, Some(user.id)).unwrap();

    console
        .set_capability(&mut session, user.id, &module("billing"), Capability::Read, false)
        .unwrap();

    let draft = console.working_user(&session).unwrap();
    assert_eq!(draft.permissions.get(&module("billing")), Some(&Permission::NONE));
    assert!(session.errors().is_empty());
}

#[test]
fn inconsistent_draft_blocks_commit() {
    let (mut console, store) = console();
    let user = admit(&mut console, "Gil", "gil@example.com", Role::Custom);
    let mut session = Session::new();
    let events = console.subscribe();
    console.select_user(&mut session, Some(user.id)).unwrap();

    console
        .set_capability(&mut session, user.id, &module("settings"), Capability::Write, true)
        .unwrap();
    let errors = console.validation_errors(&session, user.id);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "Write permission requires Read permission");

    let err = console.commit(&mut session, user.id).unwrap_err();

    assert_eq!(err.validation_errors(), Some(errors.as_slice()));
    assert_eq!(console.audit_log(user.id).len(), 1);
    assert_eq!(store.audit_count(), 1);
    assert_eq!(console.get_user(user.id), Some(&user));
    assert!(session.pending_changes());
    assert!(matches!(
        events.drain().as_slice(),
        [ConsoleEvent::CommitRejected { error_count: 1, .. }]
    ));
}

#[test]
fn commit_stores_draft_and_appends_one_entry() {
    let (mut console, store) = console();
    let user = admit(&mut console, "Hal", "hal@example.com", Role::Viewer);
    let mut session = Session::new();
    let events = console.subscribe();
    console.select_user(&mut session, Some(user.id)).unwrap();

    console.assign_role(&mut session, user.id, Role::Custom).unwrap();
    console
        .set_capability(&mut session, user.id, &module("reports"), Capability::Write, true)
        .unwrap();
    let entry = console.commit(&mut session, user.id).unwrap();

    assert_eq!(entry.action, actions::PERMISSIONS_UPDATED);
    assert_eq!(
        entry.details,
        "Permissions updated for user Hal (role: viewer -> custom); changed: Reports"
    );
    assert!(!console.pending_changes(&session, user.id));

    let stored = console.get_user(user.id).unwrap();
    assert_eq!(stored.role, Role::Custom);
    assert!(stored.permissions.get(&module("reports")).unwrap().write);

    let log = console.audit_log(user.id);
    assert_eq!(log.len(), 2);
    assert_eq!(log[0], entry);
    assert_eq!(store.audit_count(), 2);
    let persisted = store.load_all().unwrap().users;
    assert_eq!(persisted.len(), 1);
    assert_eq!(&persisted[0], stored);

    assert!(matches!(
        events.drain().as_slice(),
        [ConsoleEvent::PermissionsSaved { user_id, .. }] if *user_id == user.id
    ));
}

#[test]
fn validate_selection_is_idempotent() {
    let (mut console, _) = console();
    let user = admit(&mut console, "Ida", "ida@example.com", Role::Custom);
    let mut session = Session::new();
    console.select_user(&mut session, Some(user.id)).unwrap();
    console
        .set_capability(&mut session, user.id, &module("users"), Capability::Share, true)
        .unwrap();
    console
        .set_capability(&mut session, user.id, &module("users"), Capability::Delete, true)
        .unwrap();

    let first = console.validate_selection(&mut session).to_vec();
    let second = console.validate_selection(&mut session).to_vec();

    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].capability, Some(Capability::Delete));
    assert_eq!(first[1].capability, Some(Capability::Share));
}

#[test]
fn recent_audit_is_bounded_by_display_limit() {
    let (console, _) = console();
    let mut console = console.with_audit_display_limit(2);
    let user = admit(&mut console, "Jo", "jo@example.com", Role::Viewer);
    let mut session = Session::new();
    console.select_user(&mut session, Some(user.id)).unwrap();

    for role in [Role::Editor, Role::Admin, Role::Viewer] {
        console.assign_role(&mut session, user.id, role).unwrap();
        console.commit(&mut session, user.id).unwrap();
    }

    assert_eq!(console.audit_log(user.id).len(), 4);
    let recent = console.recent_audit(user.id);
    assert_eq!(recent.len(), 2);
    assert!(recent[0].details.contains("admin -> viewer"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Selection
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn switching_selection_discards_uncommitted_edits() {
    let (mut console, _) = console();
    let a = admit(&mut console, "Kim", "kim@example.com", Role::Viewer);
    let b = admit(&mut console, "Lee", "lee@example.com", Role::Viewer);
    let mut session = Session::new();
    let events = console.subscribe();

    console.select_user(&mut session, Some(a.id)).unwrap();
    console.assign_role(&mut session, a.id, Role::Admin).unwrap();
    console.select_user(&mut session, Some(b.id)).unwrap();

    assert_eq!(session.selected_user_id(), Some(b.id));
    assert!(!session.pending_changes());
    assert_eq!(console.get_user(a.id), Some(&a));
    assert!(matches!(
        events.drain().as_slice(),
        [ConsoleEvent::EditsDiscarded { user_id, .. }] if *user_id == a.id
    ));

    console.select_user(&mut session, Some(a.id)).unwrap();
    assert_eq!(console.working_user(&session), Some(&a));
}

#[test]
fn clean_switch_publishes_nothing() {
    let (mut console, _) = console();
    let a = admit(&mut console, "Max", "max@example.com", Role::Viewer);
    let mut session = Session::new();
    let events = console.subscribe();

    console.select_user(&mut session, Some(a.id)).unwrap();
    console.select_user(&mut session, None).unwrap();

    assert_eq!(session.selected_user_id(), None);
    assert!(events.drain().is_empty());
}

#[test]
fn edits_require_an_existing_selected_user() {
    let (mut console, _) = console();
    let a = admit(&mut console, "Ned", "ned@example.com", Role::Viewer);
    let b = admit(&mut console, "Oz", "oz@example.com", Role::Viewer);
    let mut session = Session::new();

    let err = console.assign_role(&mut session, a.id, Role::Admin).unwrap_err();
    assert!(matches!(err, ConsoleError::Precondition(DomainError::NotSelected(_))));

    console.select_user(&mut session, Some(a.id)).unwrap();
    let err = console
        .set_capability(&mut session, b.id, &module("reports"), Capability::Read, true)
        .unwrap_err();
    assert!(err.is_precondition());

    let ghost = UserId::new();
    let err = console.select_user(&mut session, Some(ghost)).unwrap_err();
    assert!(matches!(err, ConsoleError::Precondition(DomainError::UnknownUser(_))));
    assert_eq!(session.selected_user_id(), Some(a.id));

    let err = console.commit(&mut session, ghost).unwrap_err();
    assert!(matches!(err, ConsoleError::Precondition(DomainError::UnknownUser(_))));
}

#[test]
fn unknown_module_leaves_draft_untouched() {
    let (mut console, _) = console();
    let user = admit(&mut console, "Pia", "pia@example.com", Role::Editor);
    let mut session = Session::new();
    console.select_user(&mut session, Some(user.id)).unwrap();

    let err = console
        .set_capability(&mut session, user.id, &module("payroll"), Capability::Read, true)
        .unwrap_err();

    assert!(matches!(err, ConsoleError::Precondition(DomainError::UnknownModule(_))));
    assert_eq!(console.working_user(&session), Some(&user));
    assert!(!session.pending_changes());
}

// ─────────────────────────────────────────────────────────────────────────────
// Email lookups
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn stale_lookup_never_overwrites_newer_status() {
    let (mut console, _) = console();
    admit(&mut console, "Quinn", "quinn@example.com", Role::Viewer);
    let mut tracker = EmailAvailability::new();

    let stale = tracker.begin("quinn@example.com");
    let latest = tracker.begin("quinn2@example.com");

    let latest_outcome = console.check_email(&latest);
    let stale_outcome = console.check_email(&stale);
    assert!(tracker.resolve(&latest_outcome));
    assert!(!tracker.resolve(&stale_outcome));

    assert!(stale_outcome.taken);
    assert_eq!(tracker.status(), EmailStatus::Available);
}

// ─────────────────────────────────────────────────────────────────────────────
// Failures
// ─────────────────────────────────────────────────────────────────────────────

/// Store that starts refusing saves once `fail` is set.
#[derive(Debug, Default)]
struct FlakyStore {
    inner: InMemoryConsoleStore,
    fail: AtomicBool,
}

impl ConsoleStore for FlakyStore {
    fn load_all(&self) -> Result<StoredState, StoreError> {
        self.inner.load_all()
    }

    fn save(&self, users: &[User], audit: &[AuditLogEntry]) -> Result<(), StoreError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Poisoned);
        }
        self.inner.save(users, audit)
    }
}

#[test]
fn failed_save_leaves_everything_unchanged() {
    let store = Arc::new(FlakyStore::default());
    let mut console = Console::load(
        store.clone(),
        InMemoryEventBus::<ConsoleEvent>::new(),
        ModuleCatalog::standard(),
    )
    .unwrap();
    let user = console
        .create_user(NewUser::new("Ray", "ray@example.com", Role::Viewer))
        .unwrap();
    let mut session = Session::new();
    console.select_user(&mut session, Some(user.id)).unwrap();
    console.assign_role(&mut session, user.id, Role::Editor).unwrap();

    store.fail.store(true, Ordering::SeqCst);

    let err = console.commit(&mut session, user.id).unwrap_err();
    assert!(matches!(err, ConsoleError::Store(StoreError::Poisoned)));
    assert_eq!(console.get_user(user.id), Some(&user));
    assert_eq!(console.audit_log(user.id).len(), 1);
    assert!(session.pending_changes());
    assert_eq!(session.draft().unwrap().role, Role::Editor);

    let err = console
        .create_user(NewUser::new("Sam", "sam@example.com", Role::Viewer))
        .unwrap_err();
    assert!(matches!(err, ConsoleError::Store(_)));
    assert_eq!(console.list_users().len(), 1);

    store.fail.store(false, Ordering::SeqCst);
    console.commit(&mut session, user.id).unwrap();
    assert_eq!(console.get_user(user.id).unwrap().role, Role::Editor);
}

#[test]
fn failed_audit_write_keeps_users_file_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let mut console = Console::load(
        JsonFileStore::open(dir.path()).unwrap(),
        InMemoryEventBus::<ConsoleEvent>::new(),
        ModuleCatalog::standard(),
    )
    .unwrap();
    let user = console
        .create_user(NewUser::new("Kim", "kim@example.com", Role::Viewer))
        .unwrap();
    let mut session = Session::new();
    console.select_user(&mut session, Some(user.id)).unwrap();
    console.assign_role(&mut session, user.id, Role::Admin).unwrap();

    // Only the audit half of the next save can fail.
    std::fs::create_dir(dir.path().join(".audit.json.tmp")).unwrap();

    let err = console.commit(&mut session, user.id).unwrap_err();
    assert!(matches!(err, ConsoleError::Store(StoreError::Io { .. })));
    assert_eq!(console.get_user(user.id).unwrap().role, Role::Viewer);
    assert_eq!(console.audit_log(user.id).len(), 1);
    assert!(session.pending_changes());

    let reopened = Console::load(
        JsonFileStore::open(dir.path()).unwrap(),
        InMemoryEventBus::<ConsoleEvent>::new(),
        ModuleCatalog::standard(),
    )
    .unwrap();
    assert_eq!(reopened.get_user(user.id).unwrap().role, Role::Viewer);
    assert_eq!(reopened.audit_log(user.id).len(), 1);
}

/// Bus whose publish always fails.
#[derive(Debug)]
struct BrokenBus;

impl EventBus<ConsoleEvent> for BrokenBus {
    type Error = &'static str;

    fn publish(&self, _message: ConsoleEvent) -> Result<(), Self::Error> {
        Err("bus offline")
    }

    fn subscribe(&self) -> Subscription<ConsoleEvent> {
        let (_tx, rx) = mpsc::channel();
        Subscription::new(rx)
    }
}

#[test]
fn publish_failures_do_not_fail_operations() {
    let mut console =
        Console::load(InMemoryConsoleStore::new(), BrokenBus, ModuleCatalog::standard()).unwrap();

    let user = console
        .create_user(NewUser::new("Tia", "tia@example.com", Role::Viewer))
        .unwrap();
    let mut session = Session::new();
    console.select_user(&mut session, Some(user.id)).unwrap();
    console.assign_role(&mut session, user.id, Role::Admin).unwrap();

    assert!(console.commit(&mut session, user.id).is_ok());
}

// ─────────────────────────────────────────────────────────────────────────────
// Persistence
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn json_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = ConsoleConfig {
        data_dir: Some(dir.path().to_path_buf()),
        ..ConsoleConfig::default()
    };

    let user_id = {
        let mut console =
            Console::from_config(&config, InMemoryEventBus::<ConsoleEvent>::new()).unwrap();
        let user = console
            .create_user(NewUser::new("Uma", "uma@example.com", Role::Custom))
            .unwrap();
        let mut session = Session::new();
        console.select_user(&mut session, Some(user.id)).unwrap();
        console
            .set_capability(&mut session, user.id, &module("analytics"), Capability::Read, true)
            .unwrap();
        console.commit(&mut session, user.id).unwrap();
        user.id
    };

    let reopened = Console::<_, InMemoryEventBus<ConsoleEvent>>::load(
        JsonFileStore::open(dir.path()).unwrap(),
        InMemoryEventBus::new(),
        ModuleCatalog::standard(),
    )
    .unwrap();

    let user = reopened.get_user(user_id).unwrap();
    assert!(user.permissions.get(&module("analytics")).unwrap().read);
    let log = reopened.audit_log(user_id);
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].action, actions::PERMISSIONS_UPDATED);
    assert_eq!(log[1].action, actions::USER_CREATED);
}

// ─────────────────────────────────────────────────────────────────────────────
// Properties
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Role(Role),
    Toggle(usize, Capability, bool),
    Commit,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        prop::sample::select(Role::ALL.to_vec()).prop_map(Op::Role),
        (
            0usize..6,
            prop::sample::select(Capability::ALL.to_vec()),
            any::<bool>()
        )
            .prop_map(|(m, c, v)| Op::Toggle(m, c, v)),
        Just(Op::Commit),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn stored_users_always_satisfy_the_rules(ops in prop::collection::vec(op(), 1..40)) {
        let (mut console, _) = console();
        let user = admit(&mut console, "Prop", "prop@example.com", Role::Custom);
        let modules: Vec<ModuleId> = console.catalog().ids().cloned().collect();
        let mut session = Session::new();
        console.select_user(&mut session, Some(user.id)).unwrap();

        let mut commits = 0usize;
        for op in ops {
            match op {
                Op::Role(role) => console.assign_role(&mut session, user.id, role).unwrap(),
                Op::Toggle(m, c, v) => console
                    .set_capability(&mut session, user.id, &modules[m], c, v)
                    .unwrap(),
                Op::Commit => {
                    let blocked = !session.errors().is_empty();
                    match console.commit(&mut session, user.id) {
                        Ok(_) => {
                            prop_assert!(!blocked);
                            commits += 1;
                        }
                        Err(e) => prop_assert!(blocked && e.validation_errors().is_some()),
                    }
                }
            }

            let stored = console.get_user(user.id).unwrap();
            prop_assert!(stored.validate().is_empty());
        }

        prop_assert_eq!(console.audit_log(user.id).len(), commits + 1);
    }
}
