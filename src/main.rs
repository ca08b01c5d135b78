fn main() {
    caseform::cli::run();
}
