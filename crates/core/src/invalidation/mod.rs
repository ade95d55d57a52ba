mod events;

pub use events::{
    group_events_by_name, AccountInvalidateEvent, AclInvalidateEvent, AnyInvalidateEvent,
    CollectionInvalidateEvent, DocumentInvalidateEvent, InvalidateEventName, LifecyclePhase,
    UserInvalidateEvent, UsergroupInvalidateEvent,
};
