use bounce_tests::run_file;

run_file!(tco, "tco");
run_file!(continuations, "continuations");
run_file!(escape, "escape");
run_file!(lazy, "lazy");
run_file!(memo, "memo");
run_file!(looped, "looped");
run_file!(decorators, "decorators");
run_file!(errors, "errors");
