pub fn setup() {
    // colorized backtraces on panic, should be installed before anything else
    color_backtrace::install();
}
