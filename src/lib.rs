pub mod configuration;

pub mod envelope {
    pub mod cmpoperator;
    pub mod direction;
    pub mod envelope;
    pub mod envelopecursor;
    pub mod envelopeerror;
    pub mod envelopeinterpolate;
    pub mod envelopephysics;
    pub mod envelopepoint;
    pub mod searchableenvelope;

    pub mod part {
        pub mod envelopeattrs;
        pub mod envelopepart;
        pub mod envelopepartbuilder;

        pub mod constraints {
            pub mod envelopepartconstraint;
            pub mod speedconstraint;
            pub mod positionconstraint;
            pub mod envelopeconstraint;
            pub mod constrainedenvelopepartbuilder;
        }
    }

    pub mod builder {
        pub mod envelopebuilder;
        pub mod sweepenvelopebuilder;
        pub mod mrspenvelopebuilder;
    }

    pub mod overlay {
        mod overlaytip;
        mod overlaysplice;
        pub mod envelopeoverlaybuilder;
        pub mod overlayenvelopepartbuilder;
        pub mod overlayenvelopebuilder;
        pub mod envelopespeedcap;
    }
}
