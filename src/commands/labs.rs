//! Labs service commands (scenarios, progress, grades) and KaliGPT

use anyhow::Result;

use super::signed_in;
use crate::api::{kaligpt, labs};
use crate::app::App;
use crate::notify::Notice;

fn percent(score: Option<f64>) -> String {
    score
        .map(|s| format!("{:.0}%", s))
        .unwrap_or_else(|| "-".to_string())
}

pub async fn list_scenarios(app: &App) -> Result<()> {
    let client = app.labs_client()?;
    let scenarios = labs::get_scenarios(&client).await?;

    println!("\nScenarios:");
    println!("{:-<60}", "");

    if scenarios.is_empty() {
        println!("  (no scenarios available)");
        return Ok(());
    }

    for s in &scenarios {
        println!("{} [{}]", s.name, s.difficulty);
        println!("  ID:        {}", s.id);
        if !s.estimated_time.is_empty() {
            println!("  Time:      {}", s.estimated_time);
        }
        println!("  Exercises: {}", s.exercise_count);
        if !s.skills.is_empty() {
            println!("  Skills:    {}", s.skills.join(", "));
        }
        println!();
    }

    Ok(())
}

pub async fn show_scenario(app: &App, scenario_id: &str) -> Result<()> {
    let client = app.labs_client()?;
    let s = labs::get_scenario(&client, scenario_id).await?;

    println!();
    println!("Name:        {}", s.name);
    println!("Difficulty:  {}", s.difficulty);
    println!("Description: {}", s.description);
    if !s.target.is_empty() {
        println!("Target:      {}", s.target);
    }
    if !s.external_url.is_empty() {
        println!("URL:         {}", s.external_url);
    }
    Ok(())
}

pub async fn start_scenario(app: &App, scenario_id: &str) -> Result<()> {
    let user = signed_in(app)?;
    let client = app.labs_client()?;
    let result = labs::start_scenario(&client, scenario_id, &user.id, &user.username).await?;

    Notice::success("Scenario started", scenario_id).print();
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

pub async fn show_progress(app: &App, scenario_id: Option<&str>) -> Result<()> {
    let user = signed_in(app)?;
    let client = app.labs_client()?;
    let progress = labs::get_user_progress(&client, &user.id, scenario_id).await?;

    if progress.is_empty() {
        println!("(no progress recorded)");
        return Ok(());
    }

    for p in &progress {
        let state = if p.completed { "done" } else { "in progress" };
        println!(
            "Exercise {}: {} ({} attempts, {} hints)",
            p.exercise_id, state, p.attempts, p.hints_used
        );
        if let Some(at) = p.completed_at.as_deref().or(p.started_at.as_deref()) {
            println!("  Since: {}", at);
        }
    }
    Ok(())
}

pub async fn show_grades(app: &App) -> Result<()> {
    let user = signed_in(app)?;
    let client = app.labs_client()?;
    let grades = labs::get_user_grades(&client, &user.id, &user.username).await?;

    println!("\nGrades for {} ({}):", grades.username, grades.user_id);
    println!("{:-<60}", "");

    for scenario in &grades.scenarios {
        println!(
            "{} [{}] (avg {:.0}%, {:.0}% complete)",
            scenario.scenario_name,
            scenario.scenario_id,
            scenario.average_score,
            scenario.completion_rate
        );
        for ex in &scenario.exercises {
            let mark = if ex.completed { "✓" } else { " " };
            println!(
                "  {} {}: {}/{} challenges, mitigation {}, reflection {}, overall {}",
                mark,
                ex.exercise_title,
                ex.challenges_completed,
                ex.challenges_required,
                percent(ex.mitigation_score),
                percent(ex.reflection_score),
                percent(ex.overall_score)
            );
        }
        println!();
    }

    println!(
        "Overall: {:.0}% ({} of {} exercises)",
        grades.overall_average, grades.total_exercises_completed, grades.total_exercises_available
    );
    Ok(())
}

pub async fn show_summary(app: &App) -> Result<()> {
    let user = signed_in(app)?;
    let client = app.labs_client()?;
    let (summary, grades) = futures::try_join!(
        labs::get_lab_summary(&client, &user.id),
        labs::get_user_grades(&client, &user.id, &user.username),
    )?;

    println!();
    println!(
        "Scenarios: {} started, {} completed of {}",
        summary.scenarios_started, summary.scenarios_completed, summary.total_scenarios
    );
    println!(
        "Exercises: {} of {} completed",
        summary.exercises_completed, summary.total_exercises
    );
    println!("Completion: {:.0}%", summary.overall_completion_rate);
    println!("Average:    {:.0}%", summary.average_score);

    for scenario in &grades.scenarios {
        println!(
            "  {:<40} {:>3.0}% complete",
            scenario.scenario_name, scenario.completion_rate
        );
    }
    Ok(())
}

pub async fn kaligpt(app: &App, connect: bool) -> Result<()> {
    signed_in(app)?;
    let client = app.backend()?;
    let result = if connect {
        kaligpt::connect(client).await?
    } else {
        kaligpt::status(client).await?
    };
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(percent(Some(87.4)), "87%");
        assert_eq!(percent(None), "-");
    }
}
