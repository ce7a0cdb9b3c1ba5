pub mod utils {
    use bounce_driver::{Conf, Driver};
    use bounce_dynamics::diagnostics;
    use std::{io, path::PathBuf, thread};

    /// Non-tail recursion in programs recurses in the evaluator.
    const STACK_SIZE: usize = 64 * 1024 * 1024;

    fn run(path: PathBuf) -> Result<(), String> {
        let driver = Driver::new(Conf::default()).map_err(|err| err.to_string())?;
        diagnostics::reset();
        driver.run_file(&path, Box::new(io::stdout())).map_err(|err| err.to_string())?;
        match diagnostics::unconsumed_jumps() {
            | 0 => Ok(()),
            | n => Err(format!("{} jump records were never run", n)),
        }
    }

    pub fn run_program(path: impl Into<PathBuf>) {
        let path = path.into();
        let handle = thread::Builder::new()
            .stack_size(STACK_SIZE)
            .spawn(move || run(path))
            .expect("failed to spawn the program thread");
        match handle.join() {
            | Ok(Ok(())) => {}
            | Ok(Err(err)) => {
                eprintln!("{}", err);
                panic!("Error running program");
            }
            | Err(_) => panic!("Program thread panicked"),
        }
    }
}

#[macro_export]
macro_rules! run_file {
    ($name:ident, $file:expr) => {
        #[test]
        fn $name() {
            let path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
                .join("../../lib")
                .join(format!("{}.bnc", $file));
            ::bounce_tests::utils::run_program(path);
        }
    };
}
