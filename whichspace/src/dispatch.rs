use crate::platform::{SpaceDataSource, StatusPublisher};
use crate::tracker::SpaceTracker;
use crate::trigger::Trigger;
use whichspace_ipc::{Command, Response};

/// Answer one IPC command against the main-thread tracker.
/// `Quit` only acknowledges; stopping the application is the caller's job.
pub fn handle_ipc_command<D: SpaceDataSource, P: StatusPublisher>(
    tracker: &mut SpaceTracker<D, P>,
    cmd: &Command,
) -> Response {
    match cmd {
        Command::GetSpace => Response::Space {
            space: tracker.space_info(),
        },
        Command::Refresh => {
            tracker.refresh(Trigger::Ipc);
            Response::Space {
                space: tracker.space_info(),
            }
        }
        Command::Quit => {
            tracing::info!("Quit command received");
            Response::Ok
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::platform::mock::{
        create_test_display, create_test_record, MockSpaceDataSource, RecordingPublisher,
    };
    use whichspace_ipc::SpaceInfo;

    fn tracker() -> SpaceTracker<MockSpaceDataSource, RecordingPublisher> {
        let source = MockSpaceDataSource::new().with_record(create_test_record(
            vec![
                create_test_display("Main", 1, &[1, 2]),
                create_test_display("EXT-1", 4, &[3, 4]),
            ],
            "EXT-1",
        ));
        SpaceTracker::new(source, RecordingPublisher::default(), &Config::new())
    }

    #[test]
    fn test_get_space_does_not_query() {
        let mut tracker = tracker();
        tracker.refresh(Trigger::Startup);

        let response = handle_ipc_command(&mut tracker, &Command::GetSpace);
        assert_eq!(
            response,
            Response::Space {
                space: SpaceInfo {
                    number: Some(4),
                    label: "4".to_string()
                }
            }
        );
        assert_eq!(tracker.data_source().query_count(), 1);
    }

    #[test]
    fn test_refresh_requeries_and_publishes() {
        let mut tracker = tracker();
        tracker.refresh(Trigger::Startup);
        tracker.data_source().set_record(None);

        let response = handle_ipc_command(&mut tracker, &Command::Refresh);
        assert_eq!(
            response,
            Response::Space {
                space: SpaceInfo {
                    number: None,
                    label: "?".to_string()
                }
            }
        );
        assert_eq!(tracker.publisher().labels, vec!["4", "?"]);
    }

    #[test]
    fn test_quit_acknowledges() {
        let mut tracker = tracker();
        assert_eq!(
            handle_ipc_command(&mut tracker, &Command::Quit),
            Response::Ok
        );
        assert_eq!(tracker.data_source().query_count(), 0);
    }
}
