use rsmachine::executor::{CommandExecutor, CommandSpec, RealCommandExecutor};

#[test]
fn fails_for_nonexistent_command() {
    let executor = RealCommandExecutor;
    let spec = CommandSpec::new("this-command-should-not-exist", Vec::new());

    let result = executor.execute(&spec);

    assert!(result.is_err());
    if let Err(e) = result {
        let msg = e.to_string();
        assert!(
            msg.contains("not found in PATH"),
            "Expected 'not found in PATH' in error, got: {}",
            msg
        );
        let typed = e.downcast_ref::<rsmachine::RsmachineError>();
        assert!(typed.is_some(), "Expected RsmachineError, got: {:#}", e);
        assert!(
            matches!(typed.unwrap(), rsmachine::RsmachineError::CommandNotFound { .. }),
            "Expected CommandNotFound variant, got: {:?}",
            typed.unwrap()
        );
    }
}

#[test]
fn captures_stdout() {
    let executor = RealCommandExecutor;
    let spec = CommandSpec::new("echo", vec!["ID=ubuntu".to_string()]);

    let result = executor.execute(&spec).expect("echo should run");
    assert!(result.success());
    assert_eq!(result.code(), Some(0));
    assert_eq!(result.stdout, "ID=ubuntu\n");
}

#[test]
fn pipes_stdin_to_command() {
    let executor = RealCommandExecutor;
    let spec = CommandSpec::new("cat", Vec::new()).with_stdin("[Service]\nExecStart=\n");

    let result = executor.execute(&spec).expect("cat should run");
    assert!(result.success());
    assert_eq!(result.stdout, "[Service]\nExecStart=\n");
}

#[test]
fn reports_failure_through_status() {
    let executor = RealCommandExecutor;
    let spec = CommandSpec::new("false", Vec::new());

    let result = executor.execute(&spec).expect("false should still run");
    assert!(!result.success());
    assert_eq!(result.code(), Some(1));
}
