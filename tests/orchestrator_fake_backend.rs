// tests/orchestrator_fake_backend.rs

mod common;
use crate::common::{
    CommandFileBuilder, FakeBackend, FakeScript, RunnerConfigBuilder, capture_console,
    capture_merged_console, init_tracing, lines_for, split_job_line, with_timeout,
};

use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Duration;

use parallel_runner::commands::{JobDescriptor, JobSet};
use parallel_runner::engine::orchestrator::UNLAUNCHED_NAME_WIDTH;
use parallel_runner::engine::{JobOutcome, Orchestrator, OrchestratorOptions};
use parallel_runner::fs::mock::MockFileSystem;
use parallel_runner::run_file;
use parallel_runner::types::ExitPolicy;

fn job(name: Option<&str>, executable: &str) -> JobDescriptor {
    JobDescriptor::new(name, executable, "")
}

fn job_set(jobs: Vec<JobDescriptor>) -> JobSet {
    jobs.into_iter().collect()
}

#[tokio::test]
async fn successful_job_prints_start_output_and_exit() {
    init_tracing();

    let backend = FakeBackend::new().script(
        "ok",
        FakeScript::exits(0)
            .stdout_line("hello")
            .stdout_line("")
            .stdout_line("world"),
    );
    let captured = capture_console(false);
    let orchestrator = Orchestrator::new(backend, OrchestratorOptions::default());

    let jobs = job_set(vec![job(Some("t1"), "ok")]);
    let run = with_timeout(orchestrator.run(jobs, &captured.console)).await;

    assert_eq!(run.records.len(), 1);
    assert_eq!(run.records[0].exit_code(), Some(0));
    assert_eq!(run.column_width, 2);

    let printed = lines_for(&captured.out.lines(), "t1");
    assert_eq!(printed, vec!["START", "hello", "world", "Exit Code:0"]);
    assert!(captured.err.contents().is_empty());
}

#[tokio::test]
async fn stderr_lines_go_to_the_error_stream() {
    init_tracing();

    let backend = FakeBackend::new().script(
        "warns",
        FakeScript::exits(3).stdout_line("fine").stderr_line("bad thing"),
    );
    let captured = capture_console(false);
    let orchestrator = Orchestrator::new(backend, OrchestratorOptions::default());

    let jobs = job_set(vec![job(Some("w"), "warns")]);
    let run = with_timeout(orchestrator.run(jobs, &captured.console)).await;

    let record = &run.records[0];
    assert_eq!(record.exit_code(), Some(3));
    assert_eq!(record.stderr_lines, 1);
    assert_eq!(lines_for(&captured.err.lines(), "w"), vec!["bad thing"]);
    assert_eq!(lines_for(&captured.out.lines(), "w"), vec!["START", "fine", "Exit Code:3"]);
}

#[tokio::test]
async fn launch_failure_is_isolated_to_its_job() {
    init_tracing();

    let backend = FakeBackend::new()
        .script("ok", FakeScript::exits(0).stdout_line("still ran"))
        .script("denied", FakeScript::fails_to_launch("Permission denied"));
    let stats = backend.stats();
    let captured = capture_console(false);
    let orchestrator = Orchestrator::new(backend, OrchestratorOptions::default());

    let jobs = job_set(vec![
        job(Some("before"), "ok"),
        job(Some("t1"), "does-not-exist"),
        job(Some("perm"), "denied"),
        job(Some("after"), "ok"),
    ]);
    let run = with_timeout(orchestrator.run(jobs, &captured.console)).await;

    let names: Vec<_> = run.records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["before", "t1", "perm", "after"]);

    let missing = run.records[1].failure().expect("t1 should have failed");
    assert!(missing.error.contains("does-not-exist"), "got: {}", missing.error);
    assert!(missing.started_at.is_none());
    assert!(run.records[2].failure().unwrap().error.contains("Permission denied"));

    assert_eq!(run.records[0].exit_code(), Some(0));
    assert_eq!(run.records[3].exit_code(), Some(0));
    assert_eq!(stats.launched().len(), 2);

    // No START or exit line is printed for jobs that never started.
    let out = captured.out.lines();
    assert!(lines_for(&out, "t1").is_empty());
    assert!(lines_for(&out, "perm").is_empty());
    assert_eq!(lines_for(&out, "after").last().unwrap(), "Exit Code:0");
}

#[tokio::test]
async fn wait_failure_is_captured_without_exit_line() {
    init_tracing();

    let backend = FakeBackend::new().script(
        "flaky",
        FakeScript::exits(0)
            .stdout_line("partial")
            .fails_while_waiting("lost track of child"),
    );
    let captured = capture_console(false);
    let orchestrator = Orchestrator::new(backend, OrchestratorOptions::default());

    let jobs = job_set(vec![job(Some("f"), "flaky")]);
    let run = with_timeout(orchestrator.run(jobs, &captured.console)).await;

    let record = &run.records[0];
    match &record.outcome {
        JobOutcome::Failed(failure) => {
            assert!(failure.started_at.is_some());
            assert!(failure.error.contains("lost track of child"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(record.pid, Some(40000));
    assert_eq!(lines_for(&captured.out.lines(), "f"), vec!["START", "partial"]);
}

#[tokio::test]
async fn unnamed_job_is_labelled_with_its_pid() {
    init_tracing();

    let backend = FakeBackend::with_pid_base(123456)
        .script("a", FakeScript::exits(0))
        .script("b", FakeScript::exits(0).stdout_line("from b"));
    let captured = capture_console(false);
    let orchestrator = Orchestrator::new(backend, OrchestratorOptions::default());

    let jobs = job_set(vec![job(Some("x"), "a"), job(Some("yyyy"), "a"), job(None, "b")]);
    let run = with_timeout(orchestrator.run(jobs, &captured.console)).await;

    // Pids are assigned in launch order: 123456, 123457, 123458.
    let unnamed = &run.records[2];
    assert_eq!(unnamed.name, "123458");
    assert_eq!(unnamed.pid, Some(123458));
    assert_eq!(run.column_width, 6);

    let out = captured.out.lines();
    assert_eq!(lines_for(&out, "123458"), vec!["START", "from b", "Exit Code:0"]);
    let x_start = out
        .iter()
        .find(|l| l.ends_with("-START") && l.trim_start().starts_with("x:"))
        .expect("x START line");
    assert!(x_start.starts_with("     x:"), "not right-aligned: {x_start:?}");
}

#[tokio::test]
async fn unnamed_job_that_fails_to_launch_gets_a_position_label() {
    init_tracing();

    let backend = FakeBackend::new();
    let captured = capture_console(false);
    let orchestrator = Orchestrator::new(backend, OrchestratorOptions::default());

    let jobs = job_set(vec![job(None, "missing")]);
    let run = with_timeout(orchestrator.run(jobs, &captured.console)).await;

    assert_eq!(run.records[0].name, "#1");
    assert_eq!(run.column_width, 2);
}

#[tokio::test]
async fn panicked_unnamed_job_keeps_its_pid_label() {
    init_tracing();

    let backend = FakeBackend::new().script(
        "crashes",
        FakeScript::exits(0)
            .stdout_line("before the crash")
            .panics_while_waiting(),
    );
    let captured = capture_console(false);
    let orchestrator = Orchestrator::new(backend, OrchestratorOptions::default());

    let jobs = job_set(vec![job(None, "crashes")]);
    let run = with_timeout(orchestrator.run(jobs, &captured.console)).await;

    let record = &run.records[0];
    assert_eq!(record.name, "40000");
    assert_eq!(record.pid, Some(40000));
    match &record.outcome {
        JobOutcome::Failed(failure) => {
            assert!(failure.error.contains("did not complete"), "got: {}", failure.error);
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(
        lines_for(&captured.out.lines(), "40000"),
        vec!["START", "before the crash"]
    );
}

#[tokio::test]
async fn panicked_job_launched_later_keeps_its_pid_label() {
    init_tracing();

    let backend = FakeBackend::new()
        .script("ok", FakeScript::exits(0))
        .script("crashes", FakeScript::exits(0).panics_while_waiting());
    let (console, _buf) = capture_merged_console();
    let options = OrchestratorOptions {
        max_parallel: NonZeroUsize::new(1),
    };
    let orchestrator = Orchestrator::new(backend, options);

    let jobs = job_set(vec![job(Some("a"), "ok"), job(None, "crashes")]);
    let run = with_timeout(orchestrator.run(jobs, &console)).await;

    assert_eq!(run.records[0].exit_code(), Some(0));
    assert_eq!(run.records[1].name, "40001");
    assert!(run.records[1].failure().is_some());
}

#[tokio::test]
async fn stderr_output_fails_the_run_by_default() {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file("jobs.txt", CommandFileBuilder::new().named("w", "warns", "").build());
    let backend = FakeBackend::new().script("warns", FakeScript::exits(0).stderr_line("fail"));
    let config = RunnerConfigBuilder::new().build();
    let captured = capture_console(false);

    let summary = with_timeout(run_file(
        &config,
        &fs,
        Path::new("jobs.txt"),
        backend,
        captured.console.clone(),
    ))
    .await
    .unwrap();

    assert_eq!(summary.passed, 1);
    assert_eq!(summary.wrote_stderr, 1);
    assert!(config.fail_on_stderr());
    assert_eq!(summary.exit_code(config.exit_policy(), config.fail_on_stderr()), 1);
}

#[tokio::test]
async fn empty_job_set_runs_nothing() {
    init_tracing();

    let captured = capture_console(false);
    let orchestrator = Orchestrator::new(FakeBackend::new(), OrchestratorOptions::default());

    let run = with_timeout(orchestrator.run(JobSet::default(), &captured.console)).await;

    assert!(run.records.is_empty());
    assert_eq!(run.column_width, 0);
    assert!(captured.out.contents().is_empty());
}

#[tokio::test]
async fn max_parallel_bounds_running_jobs() {
    init_tracing();

    let backend = FakeBackend::new().script(
        "slow",
        FakeScript::exits(0)
            .stdout_line("tick")
            .runs_for(Duration::from_millis(30)),
    );
    let stats = backend.stats();
    let (console, _buf) = capture_merged_console();
    let options = OrchestratorOptions {
        max_parallel: NonZeroUsize::new(2),
    };
    let orchestrator = Orchestrator::new(backend, options);

    let jobs = job_set((0..6).map(|i| job(Some(&format!("j{i}")), "slow")).collect());
    let run = with_timeout(orchestrator.run(jobs, &console)).await;

    assert_eq!(run.records.len(), 6);
    assert!(run.records.iter().all(|r| r.exit_code() == Some(0)));
    assert_eq!(stats.launched().len(), 6);
    assert!(
        stats.peak_concurrency() <= 2,
        "peak concurrency was {}",
        stats.peak_concurrency()
    );
}

#[tokio::test]
async fn waiting_unnamed_jobs_reserve_pid_width() {
    init_tracing();

    let backend = FakeBackend::new().script("ok", FakeScript::exits(0));
    let (console, _buf) = capture_merged_console();
    let options = OrchestratorOptions {
        max_parallel: NonZeroUsize::new(1),
    };
    let orchestrator = Orchestrator::new(backend, options);

    let jobs = job_set(vec![job(Some("a"), "ok"), job(None, "ok")]);
    let run = with_timeout(orchestrator.run(jobs, &console)).await;

    assert_eq!(run.column_width, UNLAUNCHED_NAME_WIDTH);
    assert_eq!(run.records[1].name, "40001");
}

#[tokio::test]
async fn concurrent_output_is_never_torn_and_stays_ordered_per_job() {
    init_tracing();

    const JOBS: usize = 16;
    const LINES: usize = 200;

    let mut backend = FakeBackend::new();
    for j in 0..JOBS {
        let mut script = FakeScript::exits(0);
        for i in 0..LINES {
            script = script.stdout_line(format!("job{j}-line{i}"));
            if i % 10 == 0 {
                script = script.stderr_line(format!("job{j}-err{i}"));
            }
        }
        backend = backend.script(&format!("exe{j}"), script);
    }
    let (console, buf) = capture_merged_console();
    let orchestrator = Orchestrator::new(backend, OrchestratorOptions::default());

    let jobs = job_set(
        (0..JOBS)
            .map(|j| job(Some(&format!("job{j}")), &format!("exe{j}")))
            .collect(),
    );
    let run = with_timeout(orchestrator.run(jobs, &console)).await;
    assert!(run.records.iter().all(|r| r.exit_code() == Some(0)));

    let lines = buf.lines();
    for line in &lines {
        let (name, time, rest) =
            split_job_line(line).unwrap_or_else(|| panic!("torn line: {line:?}"));
        assert_eq!(time.len(), 8, "bad time column in {line:?}");
        assert!(
            rest == "START"
                || rest.starts_with("Exit Code:")
                || rest.starts_with(&format!("{name}-")),
            "line attributed to the wrong job: {line:?}"
        );
    }

    for j in 0..JOBS {
        let name = format!("job{j}");
        let printed = lines_for(&lines, &name);
        assert_eq!(printed.first().map(String::as_str), Some("START"));
        assert_eq!(printed.last().map(String::as_str), Some("Exit Code:0"));

        let stdout_indices: Vec<usize> = printed
            .iter()
            .filter_map(|rest| rest.strip_prefix(&format!("{name}-line")))
            .map(|n| n.parse().unwrap())
            .collect();
        assert_eq!(stdout_indices, (0..LINES).collect::<Vec<_>>());
    }
}

#[tokio::test]
async fn empty_command_file_prints_banner_and_empty_summary() {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file("jobs.txt", CommandFileBuilder::new().blank().raw("   ").build());
    let config = RunnerConfigBuilder::new().cpu_banner(true).build();
    let captured = capture_console(false);

    let summary = with_timeout(run_file(
        &config,
        &fs,
        Path::new("jobs.txt"),
        FakeBackend::new(),
        captured.console.clone(),
    ))
    .await
    .unwrap();

    assert_eq!(summary.total, 0);
    assert_eq!(summary.exit_code(config.exit_policy(), config.fail_on_stderr()), 0);

    let out = captured.out.lines();
    assert!(out[0].starts_with("Num CPUs        = "));
    assert!(out[1].starts_with("Num CPU Cores   = "));
    assert!(out[2].starts_with("Num CPU Threads = "));
    assert_eq!(&out[3..], ["", "[All Operations Completed]", "Summary:"]);
    assert!(captured.err.contents().is_empty());
}

#[tokio::test]
async fn command_file_jobs_run_in_file_order_on_the_backend() {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file(
        "jobs.txt",
        CommandFileBuilder::new()
            .named("one", "a", "--x")
            .unnamed("b", "")
            .named("three", "a", "")
            .build(),
    );
    let backend = FakeBackend::new()
        .script("a", FakeScript::exits(0))
        .script("b", FakeScript::exits(1).stderr_line("nope"));
    let stats = backend.stats();
    let config = RunnerConfigBuilder::new().fail_on_stderr(true).build();
    let captured = capture_console(false);

    let summary = with_timeout(run_file(
        &config,
        &fs,
        Path::new("jobs.txt"),
        backend,
        captured.console.clone(),
    ))
    .await
    .unwrap();

    let launched: Vec<_> = stats
        .launched()
        .into_iter()
        .map(|j| j.executable)
        .collect();
    assert_eq!(launched, vec!["a", "b", "a"]);
    assert_eq!(stats.launched()[0].arguments, "--x");

    assert_eq!(summary.passed, 2);
    assert_eq!(summary.exited_nonzero, 1);
    assert_eq!(summary.wrote_stderr, 1);
    assert_eq!(summary.exit_code(ExitPolicy::Strict, true), 1);

    // Summary rows keep file order; the unnamed job is reported under its pid.
    let out = captured.out.lines();
    let rows: Vec<_> = out
        .iter()
        .skip_while(|l| l.as_str() != "Summary:")
        .skip(1)
        .cloned()
        .collect();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].starts_with("  one:"));
    assert!(rows[1].starts_with("three:"));
    assert!(
        captured
            .err
            .lines()
            .iter()
            .any(|l| l.starts_with("40001:") && l.ends_with("s ExitCode:1"))
    );
}
