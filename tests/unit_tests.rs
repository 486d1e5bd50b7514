//! Unit tests for monty modules

mod common;

mod condition_test {
    use monty::review::Condition;

    #[test]
    fn test_passed_is_conjunction_of_children() {
        let mut root = Condition::passing("Overall", "");
        root.add(Condition::passing("a", ""));
        root.add(Condition::passing("b", ""));
        assert!(root.passed());

        root.add(Condition::failing("c", ""));
        assert!(!root.passed());

        // A later passing child never restores the parent
        root.add(Condition::passing("d", ""));
        assert!(!root.passed());
    }

    #[test]
    fn test_subconditions_keep_insertion_order() {
        let mut root = Condition::passing("Overall", "");
        for name in ["LGTM", "Commands", "Build status"] {
            root.add(Condition::passing(name, ""));
        }
        let names: Vec<&str> = root.subconditions().iter().map(Condition::name).collect();
        assert_eq!(names, vec!["LGTM", "Commands", "Build status"]);
    }

    #[test]
    fn test_deep_failure_propagates_to_root() {
        let mut leaf_parent = Condition::passing("inner", "");
        leaf_parent.add(Condition::failing("leaf", "nope"));
        let mut middle = Condition::passing("middle", "");
        middle.add(leaf_parent);
        let mut root = Condition::passing("Overall", "");
        root.add(middle);

        assert!(!root.passed());
        let causes: Vec<&str> = root.failing_leaves().iter().map(|c| c.name()).collect();
        assert_eq!(causes, vec!["leaf"]);
    }

    #[test]
    fn test_serializes_tree() {
        let mut root = Condition::passing("Overall", "All conditions met");
        root.add(Condition::passing("LGTM", "2 of 2 required LGTMs"));
        let json = serde_json::to_value(&root).unwrap();
        assert_eq!(json["name"], "Overall");
        assert_eq!(json["passed"], true);
        assert_eq!(json["subconditions"][0]["name"], "LGTM");
    }
}

mod checks_test {
    use crate::common::{make_comment, make_pr, make_pr_with_body, two_lgtms};
    use monty::review::{
        BuildStatusCheck, CommandCheck, CommandKind, Feedback, LgtmCheck, ReviewCheck,
        ReviewInput, default_checks, extract_commands,
    };
    use monty::merge::FEEDBACK_HEADER;
    use monty::types::{CombinedStatus, MissingStatusPolicy, PrComment, PullRequest};

    fn input(pr: PullRequest, comments: Vec<PrComment>, state: &str, total: u32) -> ReviewInput {
        ReviewInput {
            pull_request: pr,
            comments,
            status: CombinedStatus {
                state: state.to_string(),
                total_count: total,
            },
        }
    }

    fn with_comments(comments: Vec<PrComment>) -> ReviewInput {
        input(make_pr(1, "PR"), comments, "success", 1)
    }

    // === LGTM ===

    #[test]
    fn test_lgtm_two_approvals_pass() {
        let result = LgtmCheck::new(2).check(&with_comments(two_lgtms()));
        assert!(result.passed());
        assert_eq!(result.name(), "LGTM");
        assert_eq!(result.message(), "2 of 2 required LGTMs (from alice, bob)");
    }

    #[test]
    fn test_lgtm_one_approval_fails() {
        let comments = vec![make_comment(1, "alice", "LGTM")];
        let result = LgtmCheck::new(2).check(&with_comments(comments));
        assert!(!result.passed());
        assert!(result.message().starts_with("1 of 2"));
    }

    #[test]
    fn test_lgtm_no_comments_fails() {
        let result = LgtmCheck::new(2).check(&with_comments(vec![]));
        assert!(!result.passed());
        assert_eq!(result.message(), "0 of 2 required LGTMs");
    }

    #[test]
    fn test_lgtm_zero_threshold_passes_without_comments() {
        assert!(LgtmCheck::new(0).check(&with_comments(vec![])).passed());
    }

    #[test]
    fn test_lgtm_counts_lines_not_people() {
        let comments = vec![make_comment(1, "alice", "LGTM\nreally, LGTM")];
        let feedback = Feedback::collect(&comments);
        assert_eq!(feedback.count, 2);
        assert_eq!(feedback.people, vec!["alice".to_string()]);
        assert!(LgtmCheck::new(2).check(&with_comments(comments)).passed());
    }

    #[test]
    fn test_lgtm_inside_sentence_counts_once() {
        let comments = vec![
            make_comment(1, "alice", "looks good, LGTM"),
            make_comment(2, "bob", "no"),
        ];
        assert_eq!(Feedback::collect(&comments).count, 1);
        let result = LgtmCheck::new(1).check(&with_comments(comments));
        assert!(result.passed());
        assert_eq!(result.message(), "1 of 1 required LGTMs (from alice)");
    }

    #[test]
    fn test_plus_one_text_is_not_an_approval() {
        let comments = vec![make_comment(1, "alice", "+1 not quite")];
        assert_eq!(Feedback::collect(&comments).count, 0);
        assert!(!LgtmCheck::new(1).check(&with_comments(comments)).passed());
    }

    #[test]
    fn test_own_feedback_comment_is_not_an_approval() {
        let own = format!("{FEEDBACK_HEADER} ✔ LGTM: 2 of 2 required LGTMs\n");
        let comments = vec![make_comment(1, "alice", "LGTM"), make_comment(2, "monty", &own)];
        let feedback = Feedback::collect(&comments);
        assert_eq!(feedback.count, 1);
        assert_eq!(feedback.people, vec!["alice".to_string()]);
    }

    #[test]
    fn test_lgtm_is_case_sensitive() {
        let comments = vec![
            make_comment(1, "alice", "lgtm"),
            make_comment(2, "bob", "Lgtm"),
        ];
        assert_eq!(Feedback::collect(&comments).count, 0);
    }

    // === Commands ===

    #[test]
    fn test_extract_commands_from_body() {
        let commands = extract_commands("+radmin\nhello\n-rbot");
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].kind, CommandKind::Grant);
        assert_eq!(commands[0].argument, "admin");
        assert_eq!(commands[1].kind, CommandKind::Revoke);
        assert_eq!(commands[1].argument, "bot");
    }

    #[test]
    fn test_command_check_children_in_order() {
        let pr = make_pr_with_body(1, "+radmin\nhello");
        let comments = vec![make_comment(1, "alice", "+rdeploy")];
        let result = CommandCheck.check(&input(pr, comments, "success", 1));

        assert!(result.passed());
        assert_eq!(result.message(), "2 commands");
        let names: Vec<&str> = result.subconditions().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["+radmin", "+rdeploy"]);
    }

    #[test]
    fn test_revoke_command_blocks() {
        let pr = make_pr_with_body(1, "+radmin\nhello\n-rbot");
        let result = CommandCheck.check(&input(pr, vec![], "success", 1));
        assert!(!result.passed());
        assert_eq!(result.subconditions().len(), 2);
        assert!(result.subconditions()[0].passed());
        assert!(!result.subconditions()[1].passed());
    }

    #[test]
    fn test_no_commands_passes() {
        let result = CommandCheck.check(&with_comments(vec![make_comment(1, "a", "hi")]));
        assert!(result.passed());
        assert_eq!(result.message(), "No commands");
        assert!(result.subconditions().is_empty());
    }

    // === Build status ===

    #[test]
    fn test_build_status_success() {
        let result = BuildStatusCheck::default().check(&with_comments(vec![]));
        assert!(result.passed());
        assert_eq!(result.message(), "success");
    }

    #[test]
    fn test_build_status_other_states_fail() {
        for state in ["pending", "failure", "error"] {
            let result =
                BuildStatusCheck::default().check(&input(make_pr(1, "PR"), vec![], state, 3));
            assert!(!result.passed(), "{state} passed");
            assert_eq!(result.message(), state);
        }
    }

    #[test]
    fn test_missing_status_policy() {
        let no_ci = input(make_pr(1, "PR"), vec![], "pending", 0);
        let strict = BuildStatusCheck::new(MissingStatusPolicy::Fail).check(&no_ci);
        let lenient = BuildStatusCheck::new(MissingStatusPolicy::Pass).check(&no_ci);
        assert!(!strict.passed());
        assert!(lenient.passed());
        assert_eq!(strict.message(), "no build status reported");
    }

    #[test]
    fn test_default_check_order() {
        let checks = default_checks(2, MissingStatusPolicy::Fail);
        let names: Vec<&str> = checks.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["LGTM", "Commands", "Build status"]);
    }
}

mod render_test {
    use monty::merge::{render_commit_message, render_feedback};
    use monty::review::Condition;

    #[test]
    fn test_feedback_lists_every_check() {
        let mut root = Condition::passing("Overall", "All conditions met");
        root.add(Condition::passing("LGTM", "2 of 2 required LGTMs"));
        root.add(Condition::passing("Commands", "No commands"));
        root.add(Condition::passing("Build status", "success"));

        assert_eq!(
            render_feedback(&root),
            "I've reviewed this pull request:\n\n \
             ✔ LGTM: 2 of 2 required LGTMs\n \
             ✔ Commands: No commands\n \
             ✔ Build status: success\n"
        );
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let mut root = Condition::passing("Overall", "");
        let mut commands = Condition::passing("Commands", "1 command");
        commands.add(Condition::passing("+radmin", "granted admin"));
        root.add(commands);

        assert_eq!(render_commit_message(&root), render_commit_message(&root.clone()));
        assert!(render_commit_message(&root).contains("\n   ✔ +radmin: granted admin\n"));
    }
}

mod plan_test {
    use crate::common::make_pr;
    use monty::merge::{MergeStep, create_merge_plan};
    use monty::review::{Condition, PassedReview, Review, ReviewInput};
    use monty::types::CombinedStatus;

    fn review(number: u64, passed: bool) -> Review {
        let mut root = Condition::passing("Overall", "");
        root.add(Condition::new("Build status", passed, "state"));
        Review::new(
            ReviewInput {
                pull_request: make_pr(number, "PR"),
                comments: vec![],
                status: CombinedStatus {
                    state: "success".to_string(),
                    total_count: 1,
                },
            },
            root,
        )
    }

    #[test]
    fn test_passed_review_requires_passing_root() {
        assert!(PassedReview::try_from(review(1, true)).is_ok());
        let back = PassedReview::try_from(review(2, false)).unwrap_err();
        assert_eq!(back.id().number, 2);
    }

    #[test]
    fn test_only_passed_reviews_are_planned_for_merge() {
        let plan = create_merge_plan(vec![review(1, false), review(2, true), review(3, false)]);
        let merged: Vec<u64> = plan.merges().map(|r| r.id().number).collect();
        assert_eq!(merged, vec![2]);
        assert!(matches!(&plan.steps[0], MergeStep::Skip { reasons, .. } if reasons == &vec!["Build status: state".to_string()]));
    }
}

mod store_test {
    use crate::common::{make_pr, test_repo};
    use monty::store::{MemoryStore, PullRequestStore};
    use monty::types::Repository;

    #[tokio::test]
    async fn test_memory_store_filters_by_repository() {
        let mut other = make_pr(5, "other");
        other.repository = Repository::new("codius", "other");
        let store = MemoryStore::with_pull_requests([make_pr(2, "b"), make_pr(1, "a"), other]);

        let prs = store.get_pull_requests(&test_repo()).await.unwrap();
        let numbers: Vec<u64> = prs.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_memory_store_merged_is_monotonic() {
        let store = MemoryStore::new();
        let pr = make_pr(1, "a");
        store.put_pull_request(&pr).await.unwrap();
        store.mark_merged(&pr.id()).await.unwrap();

        // A stale sync writes the unmerged snapshot again
        store.put_pull_request(&pr).await.unwrap();
        let stored = store.get_pull_request(&pr.id()).await.unwrap().unwrap();
        assert!(stored.merged);
    }
}
