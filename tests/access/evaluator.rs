//! Evaluator properties over the whole catalog and every role.

use lectern::permission::effective_permissions;
use lectern::{Permission, Role, User, has_all_permissions, has_any_permission, has_permission};

fn every_subset() -> Vec<Vec<Permission>> {
    // Small, structured sample: empty, singletons, each domain, the catalog.
    let mut sets = vec![Vec::new(), Permission::ALL.to_vec()];
    sets.extend(Permission::ALL.iter().map(|&p| vec![p]));
    sets.push(vec![Permission::ContentRead, Permission::UsersDelete]);
    sets.push(vec![Permission::SystemStats, Permission::SystemSettings]);
    sets
}

fn sample_users() -> Vec<User> {
    let mut users: Vec<User> = ["admin", "administrator", "editor", "contributor", "viewer", "ghost"]
        .into_iter()
        .map(|role| User::with_role(format!("u-{role}"), role))
        .collect();
    users.push(User::new("bare"));
    users.push(User::with_role("override", "editor").permissions(["users.read", "bogus.entry"]));
    users
}

#[test]
fn absent_user_is_denied_every_permission() {
    for p in Permission::ALL {
        assert!(!has_permission(None, p), "{p} granted to absent user");
    }
}

#[test]
fn admin_passes_even_outside_explicit_list() {
    let admin = User::with_role("a", "admin").permissions(["content.read"]);
    for p in Permission::ALL {
        assert!(has_permission(Some(&admin), p));
    }
}

#[test]
fn any_and_all_agree_with_quantifiers() {
    for user in sample_users() {
        for set in every_subset() {
            let u = Some(&user);
            assert_eq!(
                has_all_permissions(u, &set),
                set.iter().all(|&p| has_permission(u, p)),
                "all-of mismatch for {user:?} / {set:?}"
            );
            assert_eq!(
                has_any_permission(u, &set),
                set.iter().any(|&p| has_permission(u, p)),
                "any-of mismatch for {user:?} / {set:?}"
            );
        }
        assert!(has_all_permissions(Some(&user), &[]));
        assert!(!has_any_permission(Some(&user), &[]));
    }
}

#[test]
fn explicit_list_replaces_role_default() {
    let user = User::with_role("v", "viewer").permissions(["system.stats"]);
    assert!(has_permission(Some(&user), Permission::SystemStats));
    assert!(!has_permission(Some(&user), Permission::ContentRead));

    let editor = User::with_role("e", "editor").permissions(["content.read"]);
    assert_eq!(effective_permissions(Some(&editor)), vec![Permission::ContentRead]);
}

#[test]
fn unrecognized_role_equals_viewer() {
    let ghost = User::with_role("g", "ghost");
    let viewer = User::with_role("v", "viewer");
    assert_eq!(
        effective_permissions(Some(&ghost)),
        effective_permissions(Some(&viewer))
    );
    assert_eq!(
        effective_permissions(Some(&ghost)),
        Role::LOWEST.default_permissions().to_vec()
    );
}

#[test]
fn editor_scenario() {
    let editor = User::with_role("e", "editor");
    assert!(has_permission(Some(&editor), Permission::ContentPublish));
    assert!(!has_permission(Some(&editor), Permission::UsersDelete));
}

#[test]
fn profile_json_from_identity_service() {
    let user: User = serde_json::from_str(
        r#"{"id":"9f1c","profile":{"role":"contributor","permissions":[]}}"#,
    )
    .unwrap();
    // Empty list does not override.
    assert!(has_permission(Some(&user), Permission::ContentUpdate));
    assert!(!has_permission(Some(&user), Permission::ContentPublish));
}
