use crate::calendar::CalendarYear;
use crate::clock::Clock;
use crate::gateway::Backend;
use crate::navigator::DayNavigator;
use crate::ticker::ClockFeeds;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub calendar: CalendarYear,
    pub clock: Arc<dyn Clock>,
    pub gateway: Backend,
    pub navigator: DayNavigator<Backend>,
    pub feeds: ClockFeeds,
}

impl AppState {
    pub fn new(
        calendar: CalendarYear,
        clock: Arc<dyn Clock>,
        gateway: Backend,
        navigator: DayNavigator<Backend>,
        feeds: ClockFeeds,
    ) -> Self {
        Self {
            calendar,
            clock,
            gateway,
            navigator,
            feeds,
        }
    }
}
