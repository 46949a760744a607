//! stockval-report - LIFO inventory valuation reports.

fn main() -> std::process::ExitCode {
    stockval::cmd::report_cmd::main()
}
