mod helpers;

mod error {
    mod location;
}

mod session {
    mod events;
    mod lifecycle;
    mod transfers;
}

mod transfer {
    mod thumbnail;
    mod upload;
}
