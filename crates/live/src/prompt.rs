//! System instruction for the booking agent

use thekedaar_voice_core::{TimeSlot, Worker};

/// Build the system instruction for booking `worker`.
///
/// The agent is told to call `confirmBooking` only once the user has
/// explicitly agreed on both a date and a time slot.
pub fn booking_instruction(worker: &Worker) -> String {
    let slots: Vec<&str> = TimeSlot::all().iter().map(|s| s.spoken()).collect();
    format!(
        "You are a helpful booking assistant for Thekedaar. \
         The user wants to book {name} for {profession}. \
         Help them choose a date and time. \
         Available times are {first}, {second}, {third}, and {fourth}. \
         Once they agree on a date and time, call the 'confirmBooking' function. \
         Be friendly and concise. Mention the worker's name: {name}.",
        name = worker.name,
        profession = worker.profession,
        first = slots[0],
        second = slots[1],
        third = slots[2],
        fourth = slots[3],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_names_worker_and_slots() {
        let worker = Worker::new("Ramesh Kumar", "Plumber");
        let instruction = booking_instruction(&worker);

        assert!(instruction.contains("Ramesh Kumar"));
        assert!(instruction.contains("Plumber"));
        assert!(instruction.contains("9am-11am"));
        assert!(instruction.contains("4pm-6pm"));
        assert!(instruction.contains("confirmBooking"));
    }
}
