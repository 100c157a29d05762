//! Interactive booking wizard
//!
//! Walks the user through the form's steps with dialoguer prompts. Every
//! transition goes through [`BookingForm::advance`], so the wizard applies the
//! same rules as the non-interactive `register` command.

use chrono::{NaiveDate, NaiveDateTime};
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use miette::{IntoDiagnostic, Result};

use crate::core::form::{BookingForm, FormError, Step, StepRejected};
use crate::entities::activity::Size;
use crate::entities::registration::{Confirmation, ParticipantDraft};
use crate::service::ParkService;

pub struct BookingWizard {
    theme: ColorfulTheme,
    default_email: Option<String>,
}

enum Prompted {
    Ready,
    Retry,
    Quit,
}

/// What to do once a step's fields are filled in
#[derive(Debug, PartialEq, Eq)]
enum Choice {
    Next,
    Back,
    Cancel,
}

impl Choice {
    /// Index into a next / back / cancel menu
    fn from_index(index: usize) -> Self {
        match index {
            0 => Choice::Next,
            1 => Choice::Back,
            _ => Choice::Cancel,
        }
    }
}

impl BookingWizard {
    pub fn new(default_email: Option<String>) -> Self {
        Self {
            theme: ColorfulTheme::default(),
            default_email,
        }
    }

    /// Run until the booking is confirmed (`Some`) or the user cancels (`None`)
    pub fn run(
        &self,
        form: &mut BookingForm,
        service: &mut dyn ParkService,
        now: NaiveDateTime,
    ) -> Result<Option<Confirmation>> {
        println!();
        println!(
            "{} {}",
            style("◆").cyan(),
            style("EcoHarmony Park - activity booking").bold()
        );
        println!("{}", style("─".repeat(50)).dim());

        loop {
            self.header(form.step());
            match form.step() {
                Step::Selection => match self.prompt_selection(form, &*service, now)? {
                    Prompted::Ready => {}
                    Prompted::Retry => continue,
                    Prompted::Quit => return Ok(None),
                },
                Step::Participants => match self.prompt_participants(form)? {
                    Choice::Next => {}
                    Choice::Back => {
                        form.back();
                        continue;
                    }
                    Choice::Cancel => return Ok(None),
                },
                Step::Confirmation => match self.prompt_review(form)? {
                    Choice::Next => {}
                    Choice::Back => {
                        form.back();
                        continue;
                    }
                    Choice::Cancel => return Ok(None),
                },
                Step::Completed => return Ok(form.confirmation().cloned()),
            }

            match form.advance(service, now) {
                Ok(_) => {}
                Err(FormError::Rejected(rejected)) => print_rejection(&rejected),
                Err(FormError::Service(e)) => {
                    println!("{} {}", style("✗").red(), e);
                    if !self.ask("Try again?", true)? {
                        return Ok(None);
                    }
                }
            }
        }
    }

    fn header(&self, step: Step) {
        let title = match step {
            Step::Selection => "Choose activity, date and time",
            Step::Participants => "Participants",
            Step::Confirmation => "Contact and confirmation",
            Step::Completed => "Done",
        };
        println!();
        println!(
            "{} {}",
            style(format!("Step {}/3", step.number().min(3))).cyan(),
            style(title).bold()
        );
    }

    fn prompt_selection(
        &self,
        form: &mut BookingForm,
        service: &dyn ParkService,
        now: NaiveDateTime,
    ) -> Result<Prompted> {
        let catalog = form.catalog().clone();
        let labels: Vec<String> = catalog.iter().map(|a| a.to_string()).collect();
        let current = form
            .activity()
            .and_then(|a| catalog.iter().position(|c| c.id == a.id))
            .unwrap_or(0);
        let index = Select::with_theme(&self.theme)
            .with_prompt("Activity")
            .items(&labels)
            .default(current)
            .interact()
            .into_diagnostic()?;
        let Some(activity) = catalog.iter().nth(index) else {
            return Ok(Prompted::Quit);
        };
        if form.selection().activity.as_deref() != Some(activity.name.as_str()) {
            form.set_activity(activity.name.clone());
        }

        let dates = BookingForm::calendar(now).bookable_dates();
        if dates.is_empty() {
            println!(
                "{} The park takes no bookings in the next days.",
                style("✗").red()
            );
            return Ok(Prompted::Quit);
        }
        let date = self.pick_date(&dates, form.selection().date)?;
        if form.selection().date != Some(date) {
            form.set_date(date);
        }

        let slots = form.open_slots(service, now).into_diagnostic()?;
        if slots.is_empty() {
            println!(
                "{} No places left for {} on {}.",
                style("!").yellow(),
                activity.name,
                date
            );
            return Ok(if self.ask("Pick something else?", true)? {
                Prompted::Retry
            } else {
                Prompted::Quit
            });
        }

        let labels: Vec<String> = slots
            .iter()
            .map(|s| format!("{}  ({} of {} left)", s.time, s.remaining, s.capacity))
            .collect();
        let current = form
            .selection()
            .time
            .and_then(|t| slots.iter().position(|s| s.time == t))
            .unwrap_or(0);
        let index = Select::with_theme(&self.theme)
            .with_prompt("Time")
            .items(&labels)
            .default(current)
            .interact()
            .into_diagnostic()?;
        let slot = &slots[index];
        form.set_time(slot.time);

        let size: u32 = Input::with_theme(&self.theme)
            .with_prompt(format!("How many people? (1-{})", slot.remaining))
            .default(form.selection().party_size.clamp(1, slot.remaining))
            .validate_with(|n: &u32| {
                if (1..=slot.remaining).contains(n) {
                    Ok(())
                } else {
                    Err(format!("enter a number from 1 to {}", slot.remaining))
                }
            })
            .interact_text()
            .into_diagnostic()?;
        form.set_party_size(size);
        Ok(Prompted::Ready)
    }

    fn pick_date(&self, dates: &[NaiveDate], current: Option<NaiveDate>) -> Result<NaiveDate> {
        let labels: Vec<String> = dates
            .iter()
            .map(|d| d.format("%A %d/%m/%Y").to_string())
            .collect();
        let default = current
            .and_then(|c| dates.iter().position(|d| *d == c))
            .unwrap_or(0);
        let index = Select::with_theme(&self.theme)
            .with_prompt("Date")
            .items(&labels)
            .default(default)
            .interact()
            .into_diagnostic()?;
        Ok(dates[index])
    }

    fn prompt_participants(&self, form: &mut BookingForm) -> Result<Choice> {
        let Some(activity) = form.activity().cloned() else {
            return Ok(Choice::Back);
        };
        let rows = form.participants().to_vec();
        let sizes: Vec<&str> = Size::all().iter().map(|s| s.as_str()).collect();

        for (i, row) in rows.into_iter().enumerate() {
            println!("{}", style(format!("Participant {}", i + 1)).dim());
            let name: String = Input::with_theme(&self.theme)
                .with_prompt("  Full name")
                .with_initial_text(row.name)
                .interact_text()
                .into_diagnostic()?;
            let dni: String = Input::with_theme(&self.theme)
                .with_prompt("  DNI")
                .with_initial_text(row.dni)
                .interact_text()
                .into_diagnostic()?;
            let age: String = Input::with_theme(&self.theme)
                .with_prompt(if activity.min_age > 0 {
                    format!("  Age (min. {})", activity.min_age)
                } else {
                    "  Age".to_string()
                })
                .with_initial_text(row.age)
                .interact_text()
                .into_diagnostic()?;

            let mut draft = ParticipantDraft::new(name, dni, age);
            if activity.requires_size {
                let current = row
                    .size
                    .as_deref()
                    .and_then(|s| s.parse::<Size>().ok())
                    .and_then(|s| Size::all().iter().position(|x| *x == s))
                    .unwrap_or(2);
                let index = Select::with_theme(&self.theme)
                    .with_prompt("  Size")
                    .items(&sizes)
                    .default(current)
                    .interact()
                    .into_diagnostic()?;
                draft = draft.with_size(sizes[index]);
            }
            form.set_participant(i, draft);
        }

        self.choose("Participants complete?", &["Continue", "Back to selection", "Cancel"])
    }

    fn prompt_review(&self, form: &mut BookingForm) -> Result<Choice> {
        let initial = if form.email().is_empty() {
            self.default_email.clone().unwrap_or_default()
        } else {
            form.email().to_string()
        };
        let email: String = Input::with_theme(&self.theme)
            .with_prompt("Contact email")
            .with_initial_text(initial)
            .interact_text()
            .into_diagnostic()?;
        form.set_email(email);

        let accepted = self.ask("I accept the park's terms and conditions", form.accepted_terms())?;
        form.set_accepted_terms(accepted);

        let selection = form.selection();
        println!();
        println!(
            "  {} {}",
            style("Activity:").cyan(),
            selection.activity.as_deref().unwrap_or("-")
        );
        if let (Some(date), Some(time)) = (selection.date, selection.time) {
            println!("  {} {} at {}", style("When:").cyan(), date, time);
        }
        for (i, p) in form.participants().iter().enumerate() {
            println!(
                "  {} {} (DNI {}, age {}{})",
                style(format!("{}.", i + 1)).dim(),
                p.name,
                p.dni,
                p.age,
                p.size.as_deref().map(|s| format!(", size {s}")).unwrap_or_default()
            );
        }
        println!();

        self.choose("Confirm booking?", &["Confirm", "Back to participants", "Cancel"])
    }

    /// Next / back / cancel menu, in that order
    fn choose(&self, prompt: &str, items: &[&str; 3]) -> Result<Choice> {
        let choice = Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .default(0)
            .interact()
            .into_diagnostic()?;
        Ok(Choice::from_index(choice))
    }

    fn ask(&self, prompt: &str, default: bool) -> Result<bool> {
        Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(default)
            .interact()
            .into_diagnostic()
    }
}

fn print_rejection(rejected: &StepRejected) {
    println!();
    for issue in &rejected.issues {
        println!("  {} {}", style("✗").red(), issue);
    }
    if rejected.step == Step::Selection && rejected.issues.is_empty() {
        println!("  {} selection incomplete", style("✗").red());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::LocalParkService;
    use chrono::NaiveDate;

    #[test]
    fn test_menu_index_maps_to_choice() {
        assert_eq!(Choice::from_index(0), Choice::Next);
        assert_eq!(Choice::from_index(1), Choice::Back);
        assert_eq!(Choice::from_index(2), Choice::Cancel);
    }

    #[test]
    fn test_back_from_participants_keeps_rows() {
        let mut service = LocalParkService::default();
        let mut form = BookingForm::new(service.activities().unwrap());
        let now = NaiveDate::from_ymd_opt(2026, 10, 20)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        form.set_activity("Safari");
        form.set_date(now.date());
        form.set_time("10:00".parse().unwrap());
        form.advance(&mut service, now).unwrap();
        form.set_participant(0, ParticipantDraft::new("Ana", "30123456", "34"));

        // What the menu's "Back to selection" does
        assert_eq!(form.back(), Step::Selection);
        assert_eq!(form.participants()[0].name, "Ana");
    }
}
