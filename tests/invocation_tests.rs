use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use uplugin_build::invocation::{resolve_invocation, Prompt, WorkspaceSource, ENGINE_DIR_QUESTION};
use uplugin_build::{BuildError, Result};

/// Answers questions from a queue and remembers what was asked.
#[derive(Default)]
struct Recorder {
    answers: VecDeque<String>,
    asked: Vec<String>,
}

impl Recorder {
    fn answering(answer: &str) -> Self {
        Self { answers: VecDeque::from([answer.to_string()]), asked: Vec::new() }
    }
}

impl Prompt for Recorder {
    fn ask(&mut self, question: &str) -> Result<String> {
        self.asked.push(question.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| BuildError::validation("unexpected prompt"))
    }
}

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

const CWD: &str = "/home/dev/work";

#[test]
fn test_no_arguments_prompts_for_engine() {
    for in_repo in [true, false] {
        let mut prompt = Recorder::answering("/opt/UE_5.3");
        let inv = resolve_invocation(&[], Path::new(CWD), in_repo, &mut prompt).unwrap();

        assert_eq!(prompt.asked, vec![ENGINE_DIR_QUESTION.to_string()]);
        assert_eq!(inv.engine_dir, PathBuf::from("/opt/UE_5.3"));
        assert_eq!(inv.workspace, WorkspaceSource::Existing(PathBuf::from(CWD)));
        assert!(inv.extra_flags.is_empty());
    }
}

#[test]
fn test_engine_only_builds_cwd() {
    for in_repo in [true, false] {
        let mut prompt = Recorder::default();
        let inv =
            resolve_invocation(&args(&["/opt/UE_5.3"]), Path::new(CWD), in_repo, &mut prompt)
                .unwrap();

        assert!(prompt.asked.is_empty());
        assert_eq!(inv.workspace.root(), Path::new(CWD));
        assert!(inv.extra_flags.is_empty());
    }
}

#[test]
fn test_in_repository_everything_after_engine_is_flags() {
    let mut prompt = Recorder::default();
    let inv = resolve_invocation(
        &args(&["/opt/UE_5.3", "https://github.com/org/Plugin.git", "-NoHostPlatform"]),
        Path::new(CWD),
        true,
        &mut prompt,
    )
    .unwrap();

    assert_eq!(inv.workspace, WorkspaceSource::Existing(PathBuf::from(CWD)));
    assert_eq!(
        inv.extra_flags,
        args(&["https://github.com/org/Plugin.git", "-NoHostPlatform"])
    );
}

#[test]
fn test_outside_repository_second_argument_is_clone_url() {
    let mut prompt = Recorder::default();
    let inv = resolve_invocation(
        &args(&[
            "/opt/UE_5.3",
            "https://github.com/Conv-AI/Convai-UnrealEngine-SDK.git",
            "-TargetPlatforms=Win64",
            "-NoHostPlatform",
        ]),
        Path::new(CWD),
        false,
        &mut prompt,
    )
    .unwrap();

    assert_eq!(
        inv.workspace,
        WorkspaceSource::Clone {
            url: "https://github.com/Conv-AI/Convai-UnrealEngine-SDK.git".to_string(),
            dir: PathBuf::from(CWD).join("Convai-UnrealEngine-SDK"),
        }
    );
    assert_eq!(inv.extra_flags, args(&["-TargetPlatforms=Win64", "-NoHostPlatform"]));
}

#[test]
fn test_empty_prompt_answer_is_rejected() {
    let mut prompt = Recorder::answering("   ");
    let err = resolve_invocation(&[], Path::new(CWD), true, &mut prompt).unwrap_err();
    assert!(matches!(err, BuildError::Validation(_)));
}

#[test]
fn test_clone_directory_comes_from_url() {
    let mut prompt = Recorder::default();
    let inv = resolve_invocation(
        &args(&["/opt/UE_5.3", "https://host/"]),
        Path::new(CWD),
        false,
        &mut prompt,
    )
    .unwrap();
    assert_eq!(inv.workspace.root(), Path::new(CWD).join("host"));

    let err = resolve_invocation(
        &args(&["/opt/UE_5.3", "/"]),
        Path::new(CWD),
        false,
        &mut prompt,
    )
    .unwrap_err();
    assert!(matches!(err, BuildError::Validation(_)));
}
