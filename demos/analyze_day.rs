//! Analyze one day of study metrics and print the result

fn main() {
    let json = r#"{
        "study_hours": 8.5,
        "sleep_hours": 6,
        "break_time": "0.5",
        "screen_time": 9,
        "mood_level": "Medium"
    }"#;

    match learnsmart_engine::analyze_daily_json(json.to_string()) {
        Ok(analysis) => print!("{analysis}"),
        Err(e) => eprintln!("Error: {e:?}"),
    }
}
