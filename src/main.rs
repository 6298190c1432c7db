fn main() {
    participant_import_lib::run()
}
