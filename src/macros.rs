#[macro_export]
macro_rules! flag {
    ( $x:expr ) => {{
        $crate::Flag::new($x as u16).unwrap()
    }};
}

#[macro_export]
macro_rules! flagset {
    ( $( $x:expr ),* $(,)? ) => {
        {
            $crate::FlagSet::from_iter( [ $( $crate::flag!( $x ) ),* ] )
        }
    }
}
