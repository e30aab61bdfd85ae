//! Unit tests for patchflow modules

mod common;

mod classification_test {
    use patchflow::git::Divergence;

    // Every (local, remote, base) shape two distinct tips and a base can take
    #[test]
    fn test_exactly_one_class_per_triple() {
        let shas = ["a", "b", "c"];
        for local in shas {
            for remote in shas {
                for base in shas {
                    let class = Divergence::from_commits(local, remote, base);
                    let expected = if local == remote {
                        Divergence::UpToDate
                    } else if local == base {
                        Divergence::NeedToPull
                    } else if remote == base {
                        Divergence::NeedToPush
                    } else {
                        Divergence::Diverged
                    };
                    assert_eq!(class, expected, "({local}, {remote}, {base})");
                }
            }
        }
    }

    #[test]
    fn test_display_names() {
        assert_eq!(Divergence::NeedToPull.to_string(), "need-to-pull");
        assert_eq!(Divergence::Diverged.to_string(), "diverged");
    }
}

mod detection_test {
    use patchflow::error::Error;
    use patchflow::platform::project_path_from_remote;

    #[test]
    fn test_remote_forms() {
        for (url, expected) in [
            ("git@gitlab.example.com:salt/states.git", "salt/states"),
            ("gitlab.example.com:salt/states", "salt/states"),
            ("ssh://git@gitlab.example.com/salt/states.git", "salt/states"),
            ("https://gitlab.example.com/group/sub/project.git/", "group/sub/project"),
            ("http://localhost:8080/salt/pillar", "salt/pillar"),
        ] {
            assert_eq!(project_path_from_remote(url).unwrap(), expected, "{url}");
        }
    }

    #[test]
    fn test_unusable_remotes() {
        for url in ["", "/srv/git/states.git", "https://gitlab.example.com/", "git@host:states"] {
            assert!(
                matches!(project_path_from_remote(url), Err(Error::Config(_))),
                "{url}"
            );
        }
    }
}

mod issue_state_test {
    use crate::common::{MockPlatformService, make_issue, test_project};
    use patchflow::error::Error;
    use patchflow::report::Level;
    use patchflow::types::{IssueAction, IssueState};
    use patchflow::workflow::set_issue_state;

    #[tokio::test]
    async fn test_close_issue() {
        let mock = MockPlatformService::with_project(test_project());
        mock.add_issue(make_issue(4, "Broken pillar"));

        let report = set_issue_state(&mock, "4", IssueAction::Close).await.unwrap();

        assert_eq!(mock.set_issue_state_calls(), vec![(4, IssueAction::Close)]);
        assert_eq!(report.max_level(), Some(Level::Success));
        assert!(report.contains("Issue 4 closed"));
    }

    #[tokio::test]
    async fn test_reopen_issue() {
        let mock = MockPlatformService::with_project(test_project());
        let mut issue = make_issue(5, "Flaky state");
        issue.state = IssueState::Closed;
        mock.add_issue(issue);

        let report = set_issue_state(&mock, "5", IssueAction::Reopen).await.unwrap();
        assert!(report.contains("Issue 5 reopened"));
    }

    #[tokio::test]
    async fn test_missing_issue_is_not_found() {
        let mock = MockPlatformService::with_project(test_project());
        let err = set_issue_state(&mock, "9", IssueAction::Close)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(mock.set_issue_state_calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_id_never_reaches_platform() {
        let mock = MockPlatformService::with_project(test_project());
        let err = set_issue_state(&mock, "four", IssueAction::Close)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(mock.get_issue_calls().is_empty());
    }

    #[tokio::test]
    async fn test_platform_errors_propagate() {
        let mock = MockPlatformService::with_project(test_project());
        mock.fail_get_issue("boom");
        let err = set_issue_state(&mock, "4", IssueAction::Close)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Platform(_)));
    }
}

mod compare_test {
    use crate::common::{MockPlatformService, test_project};
    use patchflow::config::Settings;
    use patchflow::error::Error;
    use patchflow::types::GroupProject;
    use patchflow::workflow::missing_projects;

    fn project(url: &str) -> GroupProject {
        GroupProject {
            ssh_url: url.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_local_and_ignored_projects_are_filtered() {
        let mock = MockPlatformService::with_project(test_project());
        mock.add_group_project(project("git@host:salt/states.git"));
        mock.add_group_project(project("git@host:salt/pillar.git"));
        mock.add_group_project(project("git@host:salt/legacy.git"));

        let settings = Settings {
            group: Some("salt".to_string()),
            ignore_repositories: vec!["git@host:salt/legacy.git".to_string()],
            ..Settings::default()
        };
        let local = vec!["git@host:salt/states.git".to_string()];

        let missing = missing_projects(&mock, &settings, &local).await.unwrap();
        let urls: Vec<&str> = missing.iter().map(|p| p.ssh_url.as_str()).collect();
        assert_eq!(urls, vec!["git@host:salt/pillar.git"]);
    }

    #[tokio::test]
    async fn test_group_is_required() {
        let mock = MockPlatformService::with_project(test_project());
        let err = missing_projects(&mock, &Settings::default(), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}

mod gitlab_test {
    use mockito::{Matcher, Server, ServerGuard};
    use patchflow::error::Error;
    use patchflow::platform::{GitLabService, PlatformService};
    use patchflow::types::{IssueAction, IssueState, MergeRequestState, NewMergeRequest};
    use serde_json::json;

    const TOKEN: &str = "glpat-test";

    async fn connect(server: &mut ServerGuard) -> GitLabService {
        server
            .mock("GET", "/api/v4/projects/salt%2Fstates")
            .match_header("PRIVATE-TOKEN", TOKEN)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "id": 77,
                    "path_with_namespace": "salt/states",
                    "default_branch": "master",
                    "web_url": "https://gitlab.example.com/salt/states"
                })
                .to_string(),
            )
            .create_async()
            .await;
        GitLabService::connect(TOKEN.to_string(), &server.url(), "salt/states", None)
            .await
            .unwrap()
    }

    fn mr_json(iid: u64, state: &str) -> serde_json::Value {
        json!({
            "id": 5000 + iid,
            "iid": iid,
            "title": format!("MR {iid}"),
            "source_branch": format!("issue_{iid}"),
            "target_branch": "master",
            "state": state,
            "author": {"id": 1, "name": "Jane Doe", "username": "jane"},
            "assignee": null,
            "created_at": "2024-03-01T10:00:00.000Z",
            "web_url": format!("https://gitlab.example.com/salt/states/-/merge_requests/{iid}")
        })
    }

    #[tokio::test]
    async fn test_connect_resolves_project() {
        let mut server = Server::new_async().await;
        let service = connect(&mut server).await;

        let project = service.project();
        assert_eq!(project.id, 77);
        assert_eq!(project.path, "salt/states");
        assert_eq!(project.default_branch.as_deref(), Some("master"));
    }

    #[tokio::test]
    async fn test_connect_unknown_project_is_not_found() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/v4/projects/salt%2Fmissing")
            .with_status(404)
            .create_async()
            .await;

        let result =
            GitLabService::connect(TOKEN.to_string(), &server.url(), "salt/missing", None).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_issue_maps_404_to_none() {
        let mut server = Server::new_async().await;
        let service = connect(&mut server).await;
        server
            .mock("GET", "/api/v4/projects/77/issues/5")
            .with_status(404)
            .create_async()
            .await;

        assert!(service.get_issue(5).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_issue() {
        let mut server = Server::new_async().await;
        let service = connect(&mut server).await;
        server
            .mock("GET", "/api/v4/projects/77/issues/4")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "id": 1004,
                    "iid": 4,
                    "project_id": 77,
                    "title": "Broken pillar",
                    "description": null,
                    "state": "reopened",
                    "author": {"id": 1, "name": "Jane Doe", "username": "jane"},
                    "web_url": "https://gitlab.example.com/salt/states/-/issues/4"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let issue = service.get_issue(4).await.unwrap().unwrap();
        assert_eq!(issue.iid, 4);
        assert_eq!(issue.project_id, 77);
        assert_eq!(issue.state, IssueState::Opened);
        assert!(issue.assignee.is_none());
    }

    #[tokio::test]
    async fn test_list_merge_requests_maps_states() {
        let mut server = Server::new_async().await;
        let service = connect(&mut server).await;
        server
            .mock("GET", "/api/v4/projects/77/merge_requests")
            .match_query(Matcher::UrlEncoded("per_page".into(), "100".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!([mr_json(1, "opened"), mr_json(2, "locked"), mr_json(3, "merged")])
                    .to_string(),
            )
            .create_async()
            .await;

        let states: Vec<MergeRequestState> = service
            .list_merge_requests()
            .await
            .unwrap()
            .into_iter()
            .map(|mr| mr.state)
            .collect();
        assert_eq!(
            states,
            vec![
                MergeRequestState::Opened,
                MergeRequestState::Closed,
                MergeRequestState::Merged
            ]
        );
    }

    #[tokio::test]
    async fn test_find_open_merge_request_uses_listing() {
        let mut server = Server::new_async().await;
        let service = connect(&mut server).await;
        server
            .mock("GET", "/api/v4/projects/77/merge_requests")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!([mr_json(1, "merged"), mr_json(2, "opened")]).to_string())
            .create_async()
            .await;

        let found = service
            .find_open_merge_request("issue_2", "master")
            .await
            .unwrap();
        assert_eq!(found.map(|mr| mr.iid), Some(2));
        assert!(
            service
                .find_open_merge_request("issue_1", "master")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_create_merge_request_payload() {
        let mut server = Server::new_async().await;
        let service = connect(&mut server).await;
        let mock = server
            .mock("POST", "/api/v4/projects/77/merge_requests")
            .match_body(Matcher::PartialJson(json!({
                "source_branch": "issue_4",
                "target_branch": "master",
                "title": "Fix pillar lookup",
                "assignee_id": 12
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(mr_json(4, "opened").to_string())
            .create_async()
            .await;

        let mr = service
            .create_merge_request(&NewMergeRequest {
                source_branch: "issue_4".to_string(),
                target_branch: "master".to_string(),
                title: "Fix pillar lookup".to_string(),
                assignee_id: Some(12),
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(mr.iid, 4);
        assert_eq!(mr.state, MergeRequestState::Opened);
    }

    #[tokio::test]
    async fn test_accept_merge_request() {
        let mut server = Server::new_async().await;
        let service = connect(&mut server).await;
        server
            .mock("PUT", "/api/v4/projects/77/merge_requests/3/merge")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(mr_json(3, "merged").to_string())
            .create_async()
            .await;

        let mr = service.accept_merge_request(3).await.unwrap();
        assert_eq!(mr.state, MergeRequestState::Merged);
        assert_eq!(mr.source_branch, "issue_3");
    }

    #[tokio::test]
    async fn test_accept_rejected_is_api_error() {
        let mut server = Server::new_async().await;
        let service = connect(&mut server).await;
        server
            .mock("PUT", "/api/v4/projects/77/merge_requests/3/merge")
            .with_status(405)
            .create_async()
            .await;

        let err = service.accept_merge_request(3).await.unwrap_err();
        assert!(matches!(err, Error::GitLabApi(_)));
    }

    #[tokio::test]
    async fn test_notes_skip_system_notes() {
        let mut server = Server::new_async().await;
        let service = connect(&mut server).await;
        server
            .mock("GET", "/api/v4/projects/77/merge_requests/3/notes")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!([
                    {"id": 1, "body": "added 1 commit", "system": true,
                     "author": {"id": 1, "name": "Jane Doe", "username": "jane"}},
                    {"id": 2, "body": "Looks good", "system": false,
                     "author": {"id": 2, "name": "John Roe", "username": "john"}}
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let notes = service.list_merge_request_notes(3).await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].body, "Looks good");
    }

    #[tokio::test]
    async fn test_set_issue_state_sends_state_event() {
        let mut server = Server::new_async().await;
        let service = connect(&mut server).await;
        let mock = server
            .mock("PUT", "/api/v4/projects/77/issues/4")
            .match_body(Matcher::PartialJson(json!({"state_event": "close"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "id": 1004, "iid": 4, "project_id": 77, "title": "Broken pillar",
                    "state": "closed",
                    "web_url": "https://gitlab.example.com/salt/states/-/issues/4"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let issue = service.set_issue_state(4, IssueAction::Close).await.unwrap();
        mock.assert_async().await;
        assert_eq!(issue.state, IssueState::Closed);
    }

    #[tokio::test]
    async fn test_branch_exists() {
        let mut server = Server::new_async().await;
        let service = connect(&mut server).await;
        server
            .mock("GET", "/api/v4/projects/77/repository/branches/issue_4")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"name": "issue_4"}).to_string())
            .create_async()
            .await;
        server
            .mock("GET", "/api/v4/projects/77/repository/branches/issue_5")
            .with_status(404)
            .create_async()
            .await;

        assert!(service.branch_exists("issue_4").await.unwrap());
        assert!(!service.branch_exists("issue_5").await.unwrap());
    }

    #[tokio::test]
    async fn test_group_members_resolve_group_by_name() {
        let mut server = Server::new_async().await;
        let service = connect(&mut server).await;
        server
            .mock("GET", "/api/v4/groups")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!([
                    {"id": 11, "name": "pillar", "full_path": "salt/pillar"},
                    {"id": 12, "name": "salt", "full_path": "salt"}
                ])
                .to_string(),
            )
            .create_async()
            .await;
        server
            .mock("GET", "/api/v4/groups/12/members")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!([{"id": 2, "name": "John Roe", "username": "john"}]).to_string())
            .create_async()
            .await;

        let members = service.list_group_members("salt").await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].username, "john");

        let err = service.list_group_members("nope").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_server_error_is_api_error() {
        let mut server = Server::new_async().await;
        let service = connect(&mut server).await;
        server
            .mock("GET", "/api/v4/projects/77/issues")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        assert!(matches!(
            service.list_issues().await,
            Err(Error::GitLabApi(_))
        ));
    }
}

mod github_test {
    use mockito::{Matcher, Server, ServerGuard};
    use patchflow::error::Error;
    use patchflow::platform::{GitHubService, PlatformService};
    use patchflow::types::{MergeRequestState, NewMergeRequest};
    use serde_json::json;

    const TOKEN: &str = "ghp-test";

    async fn connect(server: &mut ServerGuard) -> GitHubService {
        server
            .mock("GET", "/repos/octo/states")
            .match_header("authorization", format!("Bearer {TOKEN}").as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "id": 9,
                    "full_name": "octo/states",
                    "default_branch": "main",
                    "html_url": "https://github.com/octo/states"
                })
                .to_string(),
            )
            .create_async()
            .await;
        let url = server.url();
        GitHubService::connect(TOKEN.to_string(), Some(&url), "octo/states", None)
            .await
            .unwrap()
    }

    fn pr_json(number: u64, state: &str, merged_at: Option<&str>) -> serde_json::Value {
        json!({
            "url": format!("https://api.github.com/repos/octo/states/pulls/{number}"),
            "id": 7000 + number,
            "number": number,
            "state": state,
            "title": format!("PR {number}"),
            "merged_at": merged_at,
            "created_at": "2024-03-01T10:00:00Z",
            "html_url": format!("https://github.com/octo/states/pull/{number}"),
            "head": {"ref": format!("issue_{number}"), "sha": "1".repeat(40)},
            "base": {"ref": "main", "sha": "2".repeat(40)}
        })
    }

    #[tokio::test]
    async fn test_connect_resolves_repository() {
        let mut server = Server::new_async().await;
        let service = connect(&mut server).await;

        assert_eq!(service.project().id, 9);
        assert_eq!(service.project().default_branch.as_deref(), Some("main"));
    }

    #[tokio::test]
    async fn test_get_merge_request_maps_404_to_none() {
        let mut server = Server::new_async().await;
        let service = connect(&mut server).await;
        server
            .mock("GET", "/repos/octo/states/pulls/5")
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "message": "Not Found",
                    "documentation_url": "https://docs.github.com/rest"
                })
                .to_string(),
            )
            .create_async()
            .await;

        assert!(service.get_merge_request(5).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pull_states_map_to_merge_request_states() {
        let mut server = Server::new_async().await;
        let service = connect(&mut server).await;
        server
            .mock("GET", "/repos/octo/states/pulls")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!([
                    pr_json(1, "open", None),
                    pr_json(2, "closed", Some("2024-03-02T10:00:00Z")),
                    pr_json(3, "closed", None)
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let requests = service.list_merge_requests().await.unwrap();
        let states: Vec<MergeRequestState> = requests.iter().map(|mr| mr.state).collect();
        assert_eq!(
            states,
            vec![
                MergeRequestState::Opened,
                MergeRequestState::Merged,
                MergeRequestState::Closed
            ]
        );
        assert_eq!(requests[0].source_branch, "issue_1");
        assert_eq!(requests[0].target_branch, "main");
    }

    #[tokio::test]
    async fn test_unknown_assignee_creates_nothing() {
        let mut server = Server::new_async().await;
        let service = connect(&mut server).await;
        server
            .mock("GET", "/user/42")
            .with_status(404)
            .create_async()
            .await;
        let create = server
            .mock("POST", "/repos/octo/states/pulls")
            .expect(0)
            .create_async()
            .await;

        let err = service
            .create_merge_request(&NewMergeRequest {
                source_branch: "issue_4".to_string(),
                target_branch: "main".to_string(),
                title: "Fix".to_string(),
                assignee_id: Some(42),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        create.assert_async().await;
    }

    #[tokio::test]
    async fn test_issue_listing_skips_pull_requests() {
        let mut server = Server::new_async().await;
        let service = connect(&mut server).await;
        server
            .mock("GET", "/repos/octo/states/issues")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!([
                    {"id": 1, "number": 1, "title": "Bug", "state": "open",
                     "html_url": "https://github.com/octo/states/issues/1"},
                    {"id": 2, "number": 2, "title": "PR", "state": "open",
                     "html_url": "https://github.com/octo/states/pull/2",
                     "pull_request": {"url": "x"}}
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let issues = service.list_issues().await.unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].iid, 1);
        assert_eq!(issues[0].project_id, 9);
    }
}
